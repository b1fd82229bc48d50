//! Online orders
//!
//! - [`money`] - 金额计算 (rust_decimal)
//! - [`status`] - 订单状态机

pub mod money;
pub mod status;

pub use status::OrderStatusMachine;

use crate::db::repository::RepoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Online order not found: {0}")]
    NotFound(i64),

    #[error("Order has no items")]
    Empty,

    #[error("Invalid order item: {0}")]
    InvalidItem(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}
