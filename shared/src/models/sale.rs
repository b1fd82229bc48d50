//! Sale Model (point-of-sale transaction)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::online_order::PaymentStatus;

/// Sale status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum SaleStatus {
    #[default]
    Completed,
    Voided,
}

/// Sale entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub organization_id: i64,
    pub branch_id: i64,
    pub sale_number: String,
    /// Online order this sale was derived from
    pub source_order_id: Option<i64>,
    pub channel: String,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub delivery_fee: f64,
    pub tip_amount: f64,
    pub total: f64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub status: SaleStatus,
    pub created_by: i64,
    pub created_at: i64,
}

/// Create sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleCreate {
    pub sale_number: String,
    pub source_order_id: Option<i64>,
    pub channel: String,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub delivery_fee: f64,
    pub tip_amount: f64,
    pub total: f64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub created_by: i64,
}

/// Sale line item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: Option<i64>,
    pub quantity: i32,
    pub unit_price: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub line_total: f64,
    /// Free-form annotation: product name, origin order, modifiers
    #[cfg_attr(feature = "db", sqlx(json))]
    pub annotation: Value,
    pub created_at: i64,
}

/// Create sale item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemCreate {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub line_total: f64,
    pub annotation: Value,
}

/// Identity of an inserted sale item, handed to the kitchen step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemRef {
    pub id: i64,
    pub product_id: Option<i64>,
}
