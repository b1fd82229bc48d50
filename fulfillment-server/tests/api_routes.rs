//! HTTP surface: scope headers, validation, response envelope

mod common;

use axum::body::Body;
use common::*;
use fulfillment_server::core::build_app;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::models::DeliveryType;
use tower::ServiceExt;

fn request(method: &str, uri: &str, body: Option<Value>) -> http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(_) => builder.header("content-type", "application/json"),
        None => builder,
    }
}

async fn send(
    state: &fulfillment_server::ServerState,
    builder: http::request::Builder,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let app = build_app(&state.config).with_state(state.clone());
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn scoped(builder: http::request::Builder) -> http::request::Builder {
    builder
        .header("x-organization-id", "1")
        .header("x-branch-id", "1")
        .header("x-actor-id", CASHIER.to_string())
}

#[tokio::test]
async fn test_health() {
    let state = state().await;
    let (status, body) = send(&state, request("GET", "/health", None), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["status"], "ok");
}

#[tokio::test]
async fn test_missing_scope_is_rejected() {
    let state = state().await;
    let (status, body) = send(&state, request("GET", "/api/online-orders/1", None), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);
}

#[tokio::test]
async fn test_malformed_scope_is_rejected() {
    let state = state().await;
    let builder = request("GET", "/api/online-orders/1", None)
        .header("x-organization-id", "acme")
        .header("x-branch-id", "1");
    let (status, body) = send(&state, builder, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn test_create_and_confirm_over_http() {
    let state = state().await;
    let payload = serde_json::to_value(order_payload("WO-3001", DeliveryType::SelfDelivery)).unwrap();

    let (status, body) = send(
        &state,
        scoped(request("POST", "/api/online-orders", Some(payload.clone()))),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "pending");
    let order_id = body["data"]["id"].as_i64().unwrap();

    let confirm = json!({ "estimated_minutes": 30 });
    let (status, body) = send(
        &state,
        scoped(request(
            "POST",
            &format!("/api/online-orders/{order_id}/confirm"),
            Some(confirm.clone()),
        )),
        Some(confirm.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["sale_id"].as_i64().is_some());
    assert!(body["data"]["shipment_id"].as_i64().is_some());
    assert_eq!(body["data"]["degraded_steps"], json!([]));

    // second confirmation conflicts
    let (status, body) = send(
        &state,
        scoped(request(
            "POST",
            &format!("/api/online-orders/{order_id}/confirm"),
            Some(confirm.clone()),
        )),
        Some(confirm),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4003);

    let (status, body) = send(
        &state,
        scoped(request(
            "GET",
            &format!("/api/online-orders/{order_id}/shipment"),
            None,
        )),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn test_confirm_validates_estimate() {
    let state = state().await;
    let order = pickup_order(&state).await;
    let confirm = json!({ "estimated_minutes": 0 });

    let (status, body) = send(
        &state,
        scoped(request(
            "POST",
            &format!("/api/online-orders/{}/confirm", order.order.id),
            Some(confirm.clone()),
        )),
        Some(confirm),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM sale").await, 0);
}

#[tokio::test]
async fn test_confirm_requires_actor() {
    let state = state().await;
    let order = pickup_order(&state).await;
    let confirm = json!({ "estimated_minutes": 20 });

    let builder = request(
        "POST",
        &format!("/api/online-orders/{}/confirm", order.order.id),
        Some(confirm.clone()),
    )
    .header("x-organization-id", "1")
    .header("x-branch-id", "1");
    let (status, _) = send(&state, builder, Some(confirm)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM sale").await, 0);
}

#[tokio::test]
async fn test_create_rejects_invalid_items() {
    let state = state().await;
    let mut data = order_payload("WO-3002", DeliveryType::Pickup);
    data.items[0].quantity = 0;
    let payload = serde_json::to_value(data).unwrap();

    let (status, body) = send(
        &state,
        scoped(request("POST", "/api/online-orders", Some(payload.clone()))),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 4005);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM online_order").await, 0);
}

#[tokio::test]
async fn test_create_rejects_blank_customer_and_long_notes() {
    let state = state().await;

    let mut blank = order_payload("WO-3003", DeliveryType::Pickup);
    blank.customer_name = "  ".to_string();
    let payload = serde_json::to_value(blank).unwrap();
    let (status, body) = send(
        &state,
        scoped(request("POST", "/api/online-orders", Some(payload.clone()))),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);

    let mut chatty = order_payload("WO-3004", DeliveryType::Pickup);
    chatty.notes = Some("x".repeat(501));
    let payload = serde_json::to_value(chatty).unwrap();
    let (status, _) = send(
        &state,
        scoped(request("POST", "/api/online-orders", Some(payload.clone()))),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM online_order").await, 0);
}

#[tokio::test]
async fn test_status_endpoint_refuses_confirmation_shortcut() {
    let state = state().await;
    let order = pickup_order(&state).await;
    let payload = json!({ "status": "confirmed" });

    let (status, _) = send(
        &state,
        scoped(request(
            "PUT",
            &format!("/api/online-orders/{}/status", order.order.id),
            Some(payload.clone()),
        )),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shipment_not_found() {
    let state = state().await;
    let (status, body) = send(
        &state,
        scoped(request("GET", "/api/shipments/12345", None)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6001);
}

#[tokio::test]
async fn test_deliver_rejects_empty_recipient() {
    let state = state().await;
    let payload = json!({ "driver_id": 1, "recipient_name": "" });
    let (status, body) = send(
        &state,
        scoped(request("POST", "/api/shipments/1/deliver", Some(payload.clone()))),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn test_reconciliation_and_board() {
    let state = state().await;
    let (status, body) = send(
        &state,
        scoped(request("GET", "/api/fulfillment/reconciliation", None)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orphaned_sales"], json!([]));

    let (status, body) = send(
        &state,
        scoped(request("GET", "/api/dispatch/board", None)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unassigned"], json!([]));
}
