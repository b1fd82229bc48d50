//! Online Order Model (web / app / WhatsApp orders)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::types::Scope;

/// Online order status
///
/// ```text
/// pending → confirmed → preparing → ready → in_delivery → delivered
///    │          │           │         │          │
///    └──────────┴───────────┴─────────┴──────────┴──→ cancelled
///    └──→ rejected
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    InDelivery,
    Delivered,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::InDelivery => "in_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }

    /// delivered / cancelled / rejected
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Rejected)
    }

    /// Only `pending` orders may be confirmed.
    pub fn is_pre_confirmation(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether `next` is reachable from `self` in one step of the lifecycle graph.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed) | (Pending, Rejected) => true,
            (Confirmed, Preparing) | (Preparing, Ready) | (Ready, InDelivery) => true,
            (InDelivery, Delivered) => true,
            (Pending | Confirmed | Preparing | Ready | InDelivery, Cancelled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum DeliveryType {
    Pickup,
    SelfDelivery,
    ThirdParty,
}

/// Ordering channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderChannel {
    Web,
    App,
    Whatsapp,
}

impl OrderChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::App => "app",
            Self::Whatsapp => "whatsapp",
        }
    }
}

/// Payment status reported by the ordering front-end
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Online order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OnlineOrder {
    pub id: i64,
    pub organization_id: i64,
    pub branch_id: i64,
    /// Human-readable number (e.g. "WO-1001")
    pub order_number: String,
    pub channel: OrderChannel,
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub delivery_type: DeliveryType,
    /// Unstructured address payload; shape varies by origin system
    #[cfg_attr(feature = "db", sqlx(json))]
    pub delivery_address: Value,
    pub is_scheduled: bool,
    pub scheduled_for: Option<i64>,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub delivery_fee: f64,
    pub tip_amount: f64,
    pub total: f64,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    /// Set once at confirmation, immutable afterwards
    pub sale_id: Option<i64>,
    pub confirmed_at: Option<i64>,
    pub confirmed_by: Option<i64>,
    pub estimated_ready_at: Option<i64>,
    pub estimated_delivery_at: Option<i64>,
    pub ready_at: Option<i64>,
    pub dispatched_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub cancellation_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OnlineOrder {
    pub fn scope(&self) -> Scope {
        Scope::new(self.organization_id, self.branch_id)
    }

    pub fn has_tip(&self) -> bool {
        self.tip_amount > 0.0
    }

    /// Trimmed coupon code, `None` when absent or blank
    pub fn coupon(&self) -> Option<&str> {
        self.coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn is_self_delivery(&self) -> bool {
        self.delivery_type == DeliveryType::SelfDelivery
    }
}

/// Online order line item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OnlineOrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i32,
    /// Price in currency unit
    pub unit_price: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub line_total: f64,
    /// Free-form modifiers (extras, removals, options)
    #[cfg_attr(feature = "db", sqlx(json))]
    pub modifiers: Value,
    pub notes: Option<String>,
}

/// Order with its line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineOrderDetail {
    #[serde(flatten)]
    pub order: OnlineOrder,
    pub items: Vec<OnlineOrderItem>,
}

/// Create order payload (ordering front-end)
///
/// Line items are checked separately (pricing rules live in the server).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OnlineOrderCreate {
    #[validate(length(max = 64, message = "order_number must be at most 64 characters"))]
    #[validate(custom(function = "not_blank", message = "order_number must not be empty"))]
    pub order_number: String,
    pub channel: OrderChannel,
    pub customer_id: Option<i64>,
    #[validate(length(max = 200, message = "customer_name must be at most 200 characters"))]
    #[validate(custom(function = "not_blank", message = "customer_name must not be empty"))]
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub delivery_address: Value,
    #[serde(default)]
    pub is_scheduled: bool,
    pub scheduled_for: Option<i64>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub subtotal: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub delivery_fee: f64,
    #[serde(default)]
    pub tip_amount: f64,
    pub total: f64,
    #[validate(length(max = 64))]
    pub coupon_code: Option<String>,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
    pub items: Vec<OnlineOrderItemInput>,
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// Create order item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineOrderItemInput {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub modifiers: Value,
    pub notes: Option<String>,
}

/// Final confirmation write (partial update)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub sale_id: i64,
    pub confirmed_at: i64,
    pub confirmed_by: i64,
    pub estimated_ready_at: i64,
    pub estimated_delivery_at: Option<i64>,
}

/// Status change (partial update, unset fields keep their value)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: Option<OrderStatus>,
    pub confirmed_at: Option<i64>,
    pub ready_at: Option<i64>,
    pub dispatched_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub cancellation_reason: Option<String>,
}
