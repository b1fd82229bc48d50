//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::ShipmentNotFound
            | Self::VehicleNotFound
            | Self::DriverNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::OrderNotConfirmable
            | Self::OrderAlreadyConfirmed
            | Self::SaleReferenceImmutable
            | Self::ShipmentInvalidTransition
            | Self::ProofAlreadyCaptured => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::ScopeMissing | Self::ScopeInvalid => StatusCode::UNAUTHORIZED,

            // 422 Unprocessable (business rule on referenced records)
            Self::VehicleUnavailable
            | Self::DriverInactive
            | Self::ShipmentNotSelfDelivery
            | Self::OrderEmpty
            | Self::OrderItemInvalid => StatusCode::UNPROCESSABLE_ENTITY,

            // 500 Internal Server Error
            Self::Unknown
            | Self::DatabaseError
            | Self::SaleCreationFailed
            | Self::SaleItemsFailed
            | Self::TicketCreationFailed
            | Self::FinalizeFailed
            | Self::TrackingNumberExhausted => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::OrderNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::ShipmentNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::OrderNotConfirmable.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::ShipmentInvalidTransition.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::SaleReferenceImmutable.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_hard_step_failures_are_server_errors() {
        assert_eq!(
            ErrorCode::SaleCreationFailed.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::FinalizeFailed.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_default_bad_request() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::InvalidRequest.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}
