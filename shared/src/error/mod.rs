//! Unified error system for the fulfillment service
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified API response format
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Scope errors
//! - 4xxx: Online order errors
//! - 5xxx: Fulfillment step errors
//! - 6xxx: Shipment errors
//! - 7xxx: Fleet errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::ShipmentNotFound);
//!
//! let err = AppError::with_message(ErrorCode::FinalizeFailed, "order 42 needs review")
//!     .with_detail("sale_id", 1001);
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(5004));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
