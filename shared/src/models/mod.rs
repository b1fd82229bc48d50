//! Data models
//!
//! Shared between fulfillment-server and its API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod coupon;
pub mod fleet;
pub mod gratuity;
pub mod kitchen;
pub mod online_order;
pub mod sale;
pub mod shipment;

// Re-exports
pub use coupon::*;
pub use fleet::*;
pub use gratuity::*;
pub use kitchen::*;
pub use online_order::*;
pub use sale::*;
pub use shipment::*;
