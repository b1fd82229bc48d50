//! Coupon & Redemption Models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Coupon {
    pub id: i64,
    pub organization_id: i64,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Percentage: 10 = 10%, fixed: amount in currency unit
    pub discount_value: f64,
    pub is_active: bool,
    pub usage_count: i64,
    pub max_uses: Option<i64>,
    /// Unix millis
    pub valid_from: Option<i64>,
    /// Unix millis
    pub valid_until: Option<i64>,
    pub created_at: i64,
}

impl Coupon {
    /// Active flag plus validity window
    pub fn is_active_at(&self, now: i64) -> bool {
        self.is_active
            && self.valid_from.is_none_or(|from| from <= now)
            && self.valid_until.is_none_or(|until| now < until)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CouponRedemption {
    pub id: i64,
    pub organization_id: i64,
    pub coupon_id: i64,
    /// Real sale id, or the order id while still an upstream placeholder
    pub sale_id: i64,
    pub customer_id: Option<i64>,
    pub discount_amount: f64,
    pub redeemed_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionCreate {
    pub coupon_id: i64,
    pub sale_id: i64,
    pub customer_id: Option<i64>,
    pub discount_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon(is_active: bool, valid_from: Option<i64>, valid_until: Option<i64>) -> Coupon {
        Coupon {
            id: 1,
            organization_id: 1,
            code: "SAVE10".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            is_active,
            usage_count: 0,
            max_uses: None,
            valid_from,
            valid_until,
            created_at: 0,
        }
    }

    #[test]
    fn test_active_without_window() {
        assert!(coupon(true, None, None).is_active_at(1_000));
        assert!(!coupon(false, None, None).is_active_at(1_000));
    }

    #[test]
    fn test_validity_window() {
        let c = coupon(true, Some(100), Some(200));
        assert!(!c.is_active_at(99));
        assert!(c.is_active_at(100));
        assert!(c.is_active_at(199));
        assert!(!c.is_active_at(200));
    }
}
