//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to `f64`
//! for storage/serialization.

use super::OrderError;
use rust_decimal::prelude::*;
use shared::models::OnlineOrderItemInput;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price
const MAX_PRICE: f64 = 100_000_000.0;
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 9999;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), OrderError> {
    if !value.is_finite() {
        return Err(OrderError::InvalidItem(format!(
            "{field_name} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

fn require_amount(value: f64, field_name: &str) -> Result<(), OrderError> {
    require_finite(value, field_name)?;
    if value < 0.0 {
        return Err(OrderError::InvalidItem(format!(
            "{field_name} must be non-negative, got {value}"
        )));
    }
    if value > MAX_PRICE {
        return Err(OrderError::InvalidItem(format!(
            "{field_name} exceeds maximum allowed ({MAX_PRICE}), got {value}"
        )));
    }
    Ok(())
}

/// Validate an incoming order line before it is stored
pub fn validate_order_item(item: &OnlineOrderItemInput) -> Result<(), OrderError> {
    if item.product_name.trim().is_empty() {
        return Err(OrderError::InvalidItem("product_name must not be empty".into()));
    }
    if item.quantity <= 0 {
        return Err(OrderError::InvalidItem(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(OrderError::InvalidItem(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {}",
            item.quantity
        )));
    }
    require_amount(item.unit_price, "unit_price")?;
    require_amount(item.tax_amount, "tax_amount")?;
    require_amount(item.discount_amount, "discount_amount")?;

    let gross = to_decimal(item.unit_price) * Decimal::from(item.quantity);
    if to_decimal(item.discount_amount) > gross {
        return Err(OrderError::InvalidItem(format!(
            "discount_amount {} exceeds line amount {}",
            item.discount_amount,
            to_f64(gross)
        )));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// `quantity × unit_price − discount + tax`
pub fn line_total(quantity: i32, unit_price: f64, discount_amount: f64, tax_amount: f64) -> f64 {
    let gross = to_decimal(unit_price) * Decimal::from(quantity);
    to_f64(gross - to_decimal(discount_amount) + to_decimal(tax_amount))
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn item(quantity: i32, unit_price: f64, discount_amount: f64) -> OnlineOrderItemInput {
        OnlineOrderItemInput {
            product_id: Some(1),
            product_name: "Bandeja paisa".to_string(),
            quantity,
            unit_price,
            tax_amount: 0.0,
            discount_amount,
            modifiers: Value::Null,
            notes: None,
        }
    }

    #[test]
    fn test_to_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum), 0.3);
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(3, 12.5, 2.0, 1.19), 36.69);
        assert_eq!(line_total(2, 0.1, 0.0, 0.2), 0.4);
    }

    #[test]
    fn test_rounding_half_up() {
        assert_eq!(to_f64(Decimal::new(12345, 3)), 12.35);
        assert_eq!(to_f64(Decimal::new(-12345, 3)), -12.35);
    }

    #[test]
    fn test_money_eq_tolerance() {
        assert!(money_eq(10.0, 10.004));
        assert!(!money_eq(10.0, 10.02));
    }

    #[test]
    fn test_validate_order_item() {
        assert!(validate_order_item(&item(1, 10.0, 0.0)).is_ok());
        assert!(validate_order_item(&item(0, 10.0, 0.0)).is_err());
        assert!(validate_order_item(&item(1, f64::NAN, 0.0)).is_err());
        assert!(validate_order_item(&item(1, -1.0, 0.0)).is_err());
        assert!(validate_order_item(&item(2, 10.0, 25.0)).is_err());
        assert!(validate_order_item(&item(10_000, 1.0, 0.0)).is_err());
    }
}
