//! Online Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::context::RequestContext;
use crate::core::ServerState;
use crate::fulfillment::{Cancellation, ConfirmOptions, ConfirmationOutcome};
use crate::orders::{OrderError, money};
use crate::utils::{ApiResponse, AppError, AppResult, ok, ok_with_message};
use shared::models::{OnlineOrder, OnlineOrderCreate, OnlineOrderDetail, OrderStatus, Shipment};

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ConfirmRequest {
    /// 预计出餐时间 (分钟)
    #[validate(range(min = 1, max = 1440))]
    pub estimated_minutes: i64,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct StatusRequest {
    pub status: OrderStatus,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct CancelRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

fn validate_create(data: &OnlineOrderCreate) -> AppResult<()> {
    data
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    if data.items.is_empty() {
        return Err(OrderError::Empty.into());
    }
    for item in &data.items {
        money::validate_order_item(item)?;
    }
    Ok(())
}

/// POST /api/online-orders - 接收线上订单 (pending)
pub async fn create(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Json(payload): Json<OnlineOrderCreate>,
) -> AppResult<Json<ApiResponse<OnlineOrderDetail>>> {
    validate_create(&payload)?;
    let detail = state
        .collaborators
        .orders
        .create(ctx.scope, payload)
        .await?;
    tracing::info!(
        order_id = detail.order.id,
        order_number = %detail.order.order_number,
        items = detail.items.len(),
        "Online order received"
    );
    Ok(ok(detail))
}

/// GET /api/online-orders/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<OnlineOrderDetail>>> {
    let detail = state
        .collaborators
        .orders
        .get(ctx.scope, id)
        .await?
        .ok_or(OrderError::NotFound(id))?;
    Ok(ok(detail))
}

/// POST /api/online-orders/:id/confirm - 确认订单 (生成销售单/厨房单/配送单)
pub async fn confirm(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(payload): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<ConfirmationOutcome>>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let options = ConfirmOptions {
        estimated_minutes: payload.estimated_minutes,
        actor_id: ctx.actor()?,
    };
    let outcome = state.orchestrator.confirm_by_id(ctx.scope, id, options).await?;
    if outcome.degraded_steps.is_empty() {
        Ok(ok(outcome))
    } else {
        let message = format!(
            "Order confirmed with {} degraded step(s)",
            outcome.degraded_steps.len()
        );
        Ok(ok_with_message(outcome, message))
    }
}

/// PUT /api/online-orders/:id/status - 推进订单状态 (preparing / ready / ...)
///
/// Confirmation only happens through `/confirm`.
pub async fn update_status(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<ApiResponse<OnlineOrder>>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    ctx.actor()?;
    if payload.status == OrderStatus::Confirmed {
        return Err(AppError::invalid_request(
            "Orders are confirmed through POST /api/online-orders/{id}/confirm",
        ));
    }
    let order = state
        .order_status
        .transition(
            ctx.scope,
            id,
            payload.status,
            shared::util::now_millis(),
            payload.reason,
        )
        .await?;
    Ok(ok(order))
}

/// POST /api/online-orders/:id/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    payload: Option<Json<CancelRequest>>,
) -> AppResult<Json<ApiResponse<Cancellation>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let cancellation = state
        .orchestrator
        .cancel_order(ctx.scope, id, ctx.actor()?, payload.reason)
        .await?;
    Ok(ok(cancellation))
}

/// GET /api/online-orders/:id/shipment
pub async fn get_shipment(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Option<Shipment>>>> {
    let shipment = state.tracker.find_for_order(ctx.scope, id).await?;
    Ok(ok(shipment))
}
