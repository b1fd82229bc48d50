//! Shipment API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::context::RequestContext;
use crate::core::ServerState;
use crate::fulfillment::address;
use crate::orders::OrderError;
use crate::shipping::Delivery;
use crate::utils::{ApiResponse, AppError, AppResult, ok};
use shared::models::{
    DeliveryAttempt, DeliveryStats, FailedAttemptInput, FailureReason, GeoPoint, ProofInput,
    ProofOfDelivery, Shipment, TransportEvent,
};

fn validate<T: Validate>(payload: &T) -> AppResult<()> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))
}

/// Both coordinates or nothing
fn geo(latitude: Option<f64>, longitude: Option<f64>) -> Option<GeoPoint> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct AssignRequest {
    #[validate(range(min = 1))]
    pub vehicle_id: i64,
    #[validate(range(min = 1))]
    pub driver_id: i64,
    pub estimated_delivery_at: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct PickupRequest {
    #[validate(range(min = 1))]
    pub driver_id: i64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DeliverRequest {
    #[validate(range(min = 1))]
    pub driver_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub recipient_name: String,
    #[validate(length(max = 50))]
    pub recipient_document: Option<String>,
    pub signature_ref: Option<String>,
    pub photo_ref: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct FailedAttemptRequest {
    #[validate(range(min = 1))]
    pub driver_id: i64,
    pub reason: FailureReason,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub photo_ref: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct CloseRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub from: i64,
    pub to: i64,
}

/// POST /api/shipments/from-order/:order_id - 为自营配送订单创建配送单 (幂等)
pub async fn create_from_order(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(order_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    let actor_id = ctx.actor()?;
    let detail = state
        .collaborators
        .orders
        .get(ctx.scope, order_id)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;
    let order = detail.order;
    let shipment = state
        .tracker
        .create_from_order(
            ctx.scope,
            &order,
            address::normalize(&order.delivery_address),
            order.estimated_delivery_at,
            actor_id,
        )
        .await?;
    Ok(ok(shipment))
}

/// GET /api/shipments/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    Ok(ok(state.tracker.get(ctx.scope, id).await?))
}

/// GET /api/shipments/:id/events - 运输事件时间线
pub async fn events(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<TransportEvent>>>> {
    Ok(ok(state.tracker.events(ctx.scope, id).await?))
}

/// GET /api/shipments/:id/attempts
pub async fn attempts(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<DeliveryAttempt>>>> {
    Ok(ok(state.tracker.attempts(ctx.scope, id).await?))
}

/// GET /api/shipments/:id/proof
pub async fn proof(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<ProofOfDelivery>>> {
    let proof = state
        .tracker
        .proof(ctx.scope, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Proof of delivery for shipment {id}")))?;
    Ok(ok(proof))
}

/// POST /api/shipments/:id/assign - 派车
pub async fn assign(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRequest>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    validate(&payload)?;
    let shipment = state
        .tracker
        .assign(
            ctx.scope,
            id,
            payload.vehicle_id,
            payload.driver_id,
            payload.estimated_delivery_at,
            ctx.actor()?,
        )
        .await?;
    Ok(ok(shipment))
}

/// POST /api/shipments/:id/pickup - 司机取件
pub async fn pickup(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(payload): Json<PickupRequest>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    validate(&payload)?;
    let shipment = state
        .tracker
        .mark_picked_up(
            ctx.scope,
            id,
            payload.driver_id,
            geo(payload.latitude, payload.longitude),
        )
        .await?;
    Ok(ok(shipment))
}

/// POST /api/shipments/:id/deliver - 签收 (附签收凭证)
pub async fn deliver(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(payload): Json<DeliverRequest>,
) -> AppResult<Json<ApiResponse<Delivery>>> {
    validate(&payload)?;
    let proof = ProofInput {
        recipient_name: payload.recipient_name,
        recipient_document: payload.recipient_document,
        signature_ref: payload.signature_ref,
        photo_ref: payload.photo_ref,
        notes: payload.notes,
        geo: geo(payload.latitude, payload.longitude),
    };
    let delivery = state
        .tracker
        .mark_delivered(ctx.scope, id, payload.driver_id, proof)
        .await?;
    Ok(ok(delivery))
}

/// POST /api/shipments/:id/failed-attempts - 投递失败登记
pub async fn failed_attempt(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(payload): Json<FailedAttemptRequest>,
) -> AppResult<Json<ApiResponse<DeliveryAttempt>>> {
    validate(&payload)?;
    let failure = FailedAttemptInput {
        reason: payload.reason,
        notes: payload.notes,
        geo: geo(payload.latitude, payload.longitude),
        photo_ref: payload.photo_ref,
    };
    let attempt = state
        .tracker
        .register_failed_attempt(ctx.scope, id, payload.driver_id, failure)
        .await?;
    Ok(ok(attempt))
}

/// POST /api/shipments/:id/return
pub async fn mark_returned(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    payload: Option<Json<CloseRequest>>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    validate(&payload)?;
    let shipment = state
        .tracker
        .mark_returned(ctx.scope, id, ctx.actor()?, payload.reason)
        .await?;
    Ok(ok(shipment))
}

/// POST /api/shipments/:id/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    payload: Option<Json<CloseRequest>>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    validate(&payload)?;
    let shipment = state
        .tracker
        .cancel(ctx.scope, id, ctx.actor()?, payload.reason)
        .await?;
    Ok(ok(shipment))
}

/// GET /api/shipments/stats?from=&to= - 配送统计
pub async fn stats(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<ApiResponse<DeliveryStats>>> {
    Ok(ok(state
        .tracker
        .delivery_stats(ctx.scope, query.from, query.to)
        .await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_requires_both_coordinates() {
        assert!(geo(Some(4.6), None).is_none());
        let point = geo(Some(4.6), Some(-74.08)).unwrap();
        assert_eq!(point.longitude, -74.08);
    }

    #[test]
    fn test_deliver_request_rejects_empty_recipient() {
        let request = DeliverRequest {
            driver_id: 1,
            recipient_name: String::new(),
            recipient_document: None,
            signature_ref: None,
            photo_ref: None,
            notes: None,
            latitude: None,
            longitude: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_pickup_request_rejects_bad_latitude() {
        let request = PickupRequest {
            driver_id: 1,
            latitude: Some(95.0),
            longitude: Some(0.0),
        };
        assert!(request.validate().is_err());
    }
}
