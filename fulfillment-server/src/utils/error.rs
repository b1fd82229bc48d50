//! 统一错误处理
//!
//! HTTP 边界统一使用 `shared::error` 中的类型：
//! - [`AppError`] - 错误码 + 消息 + 详情
//! - [`ApiResponse`] - API 响应结构
//!
//! 各层的领域错误 (`RepoError`、`OrderError`、`ShipmentError`、`FulfillmentError`)
//! 在这里转换为带错误码的 [`AppError`]。
//!
//! # 使用示例
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::not_found("Shipment 42"))
//!
//! // 返回成功响应
//! Ok(ok(data))
//! ```

use axum::Json;
use serde::Serialize;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

use crate::db::repository::RepoError;
use crate::fulfillment::FulfillmentError;
use crate::orders::OrderError;
use crate::shipping::ShipmentError;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::SaleLinked(msg) => {
                AppError::with_message(ErrorCode::SaleReferenceImmutable, msg)
            }
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, err.to_string())
                    .with_detail("order_id", id)
            }
            OrderError::Empty => AppError::with_message(ErrorCode::OrderEmpty, err.to_string()),
            OrderError::InvalidItem(_) => {
                AppError::with_message(ErrorCode::OrderItemInvalid, err.to_string())
            }
            OrderError::Repo(repo) => repo.into(),
        }
    }
}

impl From<ShipmentError> for AppError {
    fn from(err: ShipmentError) -> Self {
        let message = err.to_string();
        match err {
            ShipmentError::NotFound(id) => {
                AppError::with_message(ErrorCode::ShipmentNotFound, message)
                    .with_detail("shipment_id", id)
            }
            ShipmentError::InvalidTransition { id, from, to } => {
                AppError::with_message(ErrorCode::ShipmentInvalidTransition, message)
                    .with_detail("shipment_id", id)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            ShipmentError::NotSelfDelivery(order_id) => {
                AppError::with_message(ErrorCode::ShipmentNotSelfDelivery, message)
                    .with_detail("order_id", order_id)
            }
            ShipmentError::VehicleNotFound(_) => {
                AppError::with_message(ErrorCode::VehicleNotFound, message)
            }
            ShipmentError::VehicleUnavailable { .. } => {
                AppError::with_message(ErrorCode::VehicleUnavailable, message)
            }
            ShipmentError::DriverNotFound(_) => {
                AppError::with_message(ErrorCode::DriverNotFound, message)
            }
            ShipmentError::DriverInactive(_) => {
                AppError::with_message(ErrorCode::DriverInactive, message)
            }
            ShipmentError::ProofAlreadyCaptured(_) => {
                AppError::with_message(ErrorCode::ProofAlreadyCaptured, message)
            }
            ShipmentError::TrackingNumberExhausted(_) => {
                AppError::with_message(ErrorCode::TrackingNumberExhausted, message)
            }
            ShipmentError::InvalidRequest(msg) => AppError::invalid_request(msg),
            ShipmentError::Order(order) => order.into(),
            ShipmentError::Repo(repo) => repo.into(),
        }
    }
}

impl From<FulfillmentError> for AppError {
    fn from(err: FulfillmentError) -> Self {
        let message = err.to_string();
        match err {
            FulfillmentError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message)
                    .with_detail("order_id", id)
            }
            FulfillmentError::NotConfirmable {
                order_id,
                status,
                sale_id,
            } => {
                let code = if sale_id.is_some() {
                    ErrorCode::OrderAlreadyConfirmed
                } else {
                    ErrorCode::OrderNotConfirmable
                };
                AppError::with_message(code, message)
                    .with_detail("order_id", order_id)
                    .with_detail("status", status.as_str())
            }
            FulfillmentError::InvalidEstimate { minutes, .. } => {
                AppError::validation(message).with_detail("estimated_minutes", minutes)
            }
            FulfillmentError::EmptyOrder(order_id) => {
                AppError::with_message(ErrorCode::OrderEmpty, message)
                    .with_detail("order_id", order_id)
            }
            FulfillmentError::Step { step, .. } => {
                let code = match step {
                    crate::fulfillment::FulfillmentStep::Sale => ErrorCode::SaleCreationFailed,
                    crate::fulfillment::FulfillmentStep::SaleItems => ErrorCode::SaleItemsFailed,
                    _ => ErrorCode::TicketCreationFailed,
                };
                AppError::with_message(code, message).with_detail("step", step.as_str())
            }
            FulfillmentError::FinalizeFailed {
                order_id,
                sale_id,
                ticket_id,
                source,
            } => {
                // 并发确认: 订单已指向另一张销售单
                let code = match source {
                    RepoError::SaleLinked(_) => ErrorCode::SaleReferenceImmutable,
                    _ => ErrorCode::FinalizeFailed,
                };
                AppError::with_message(code, message)
                    .with_detail("order_id", order_id)
                    .with_detail("sale_id", sale_id)
                    .with_detail("ticket_id", ticket_id)
            }
            FulfillmentError::Order(order) => order.into(),
            FulfillmentError::Repo(repo) => repo.into(),
        }
    }
}

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Create a successful response with custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success_with_message(message, data))
}
