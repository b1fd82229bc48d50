//! Repository Module
//!
//! Free functions over `&SqlitePool`, one module per table group.
//! Every scoped lookup takes an explicit [`shared::Scope`].

// Orders
pub mod online_order;

// Ledgers
pub mod coupon;
pub mod gratuity;
pub mod kitchen;
pub mod sale;

// Delivery
pub mod fleet;
pub mod shipment;

// Back-office
pub mod reconciliation;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Row already points at a different sale
    #[error("Sale already linked: {0}")]
    SaleLinked(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("Row not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Duplicate(db_err.message().to_string())
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        RepoError::Database(format!("JSON encoding failed: {err}"))
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
