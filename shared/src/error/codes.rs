//! Unified error codes for the fulfillment service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Scope errors (organization / branch)
//! - 4xxx: Online order errors
//! - 5xxx: Fulfillment step errors (sale, kitchen ticket, finalize)
//! - 6xxx: Shipment errors
//! - 7xxx: Fleet errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Scope ====================
    /// Organization / branch headers are missing
    ScopeMissing = 1001,
    /// Organization / branch headers are malformed
    ScopeInvalid = 1002,

    // ==================== 4xxx: Online order ====================
    /// Online order not found
    OrderNotFound = 4001,
    /// Order is not in a pre-confirmation status
    OrderNotConfirmable = 4002,
    /// Order already linked to a sale
    OrderAlreadyConfirmed = 4003,
    /// Order has no line items
    OrderEmpty = 4004,
    /// Order line item failed re-verification
    OrderItemInvalid = 4005,
    /// Sale reference cannot be changed once set
    SaleReferenceImmutable = 4007,

    // ==================== 5xxx: Fulfillment ====================
    /// Sale could not be created
    SaleCreationFailed = 5001,
    /// Sale items could not be created
    SaleItemsFailed = 5002,
    /// Production ticket could not be created
    TicketCreationFailed = 5003,
    /// Final order update failed after earlier steps committed
    FinalizeFailed = 5004,

    // ==================== 6xxx: Shipment ====================
    /// Shipment not found
    ShipmentNotFound = 6001,
    /// Shipment status transition not allowed
    ShipmentInvalidTransition = 6002,
    /// Proof of delivery already captured
    ProofAlreadyCaptured = 6004,
    /// Could not allocate a unique tracking number
    TrackingNumberExhausted = 6005,
    /// Order is not a self-delivery order
    ShipmentNotSelfDelivery = 6006,

    // ==================== 7xxx: Fleet ====================
    /// Vehicle not found
    VehicleNotFound = 7001,
    /// Driver not found
    DriverNotFound = 7002,
    /// Vehicle is not in a dispatchable state
    VehicleUnavailable = 7003,
    /// Driver is inactive or license expired
    DriverInactive = 7004,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Scope
            ErrorCode::ScopeMissing => "Organization and branch scope is required",
            ErrorCode::ScopeInvalid => "Organization or branch scope is invalid",

            // Online order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderNotConfirmable => "Order is not awaiting confirmation",
            ErrorCode::OrderAlreadyConfirmed => "Order is already linked to a sale",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::OrderItemInvalid => "Order item is invalid",
            ErrorCode::SaleReferenceImmutable => "Sale reference cannot be changed",

            // Fulfillment
            ErrorCode::SaleCreationFailed => "Sale could not be created",
            ErrorCode::SaleItemsFailed => "Sale items could not be created",
            ErrorCode::TicketCreationFailed => "Production ticket could not be created",
            ErrorCode::FinalizeFailed => "Order confirmation needs reconciliation",

            // Shipment
            ErrorCode::ShipmentNotFound => "Shipment not found",
            ErrorCode::ShipmentInvalidTransition => "Shipment status transition not allowed",
            ErrorCode::ProofAlreadyCaptured => "Proof of delivery already captured",
            ErrorCode::TrackingNumberExhausted => "Could not allocate a tracking number",
            ErrorCode::ShipmentNotSelfDelivery => "Order is not a self-delivery order",

            // Fleet
            ErrorCode::VehicleNotFound => "Vehicle not found",
            ErrorCode::DriverNotFound => "Driver not found",
            ErrorCode::VehicleUnavailable => "Vehicle is not available",
            ErrorCode::DriverInactive => "Driver is inactive",

            // System
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Scope
            1001 => Ok(ErrorCode::ScopeMissing),
            1002 => Ok(ErrorCode::ScopeInvalid),

            // Online order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderNotConfirmable),
            4003 => Ok(ErrorCode::OrderAlreadyConfirmed),
            4004 => Ok(ErrorCode::OrderEmpty),
            4005 => Ok(ErrorCode::OrderItemInvalid),
            4007 => Ok(ErrorCode::SaleReferenceImmutable),

            // Fulfillment
            5001 => Ok(ErrorCode::SaleCreationFailed),
            5002 => Ok(ErrorCode::SaleItemsFailed),
            5003 => Ok(ErrorCode::TicketCreationFailed),
            5004 => Ok(ErrorCode::FinalizeFailed),

            // Shipment
            6001 => Ok(ErrorCode::ShipmentNotFound),
            6002 => Ok(ErrorCode::ShipmentInvalidTransition),
            6004 => Ok(ErrorCode::ProofAlreadyCaptured),
            6005 => Ok(ErrorCode::TrackingNumberExhausted),
            6006 => Ok(ErrorCode::ShipmentNotSelfDelivery),

            // Fleet
            7001 => Ok(ErrorCode::VehicleNotFound),
            7002 => Ok(ErrorCode::DriverNotFound),
            7003 => Ok(ErrorCode::VehicleUnavailable),
            7004 => Ok(ErrorCode::DriverInactive),

            // System
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
