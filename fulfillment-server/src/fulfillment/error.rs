use serde::Serialize;
use shared::models::OrderStatus;
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::orders::OrderError;

/// Confirmation step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStep {
    Sale,
    SaleItems,
    Ticket,
    Gratuity,
    Coupon,
    Shipment,
    Finalize,
}

impl FulfillmentStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::SaleItems => "sale_items",
            Self::Ticket => "ticket",
            Self::Gratuity => "gratuity",
            Self::Coupon => "coupon",
            Self::Shipment => "shipment",
            Self::Finalize => "finalize",
        }
    }
}

impl std::fmt::Display for FulfillmentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("Online order not found: {0}")]
    OrderNotFound(i64),

    #[error("Order {order_id} cannot be confirmed: status {status}, sale {sale_id:?}")]
    NotConfirmable {
        order_id: i64,
        status: OrderStatus,
        sale_id: Option<i64>,
    },

    #[error("Order {0} has no items")]
    EmptyOrder(i64),

    #[error("estimated_minutes must be between 1 and {max}, got {minutes}")]
    InvalidEstimate { minutes: i64, max: i64 },

    /// Hard step failed; nothing after it was attempted
    #[error("Confirmation step '{step}' failed: {source}")]
    Step {
        step: FulfillmentStep,
        #[source]
        source: RepoError,
    },

    /// Sale and ticket are committed but the order was not updated
    #[error("Order {order_id} finalize failed after sale {sale_id} / ticket {ticket_id} committed: {source}")]
    FinalizeFailed {
        order_id: i64,
        sale_id: i64,
        ticket_id: i64,
        #[source]
        source: RepoError,
    },

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}
