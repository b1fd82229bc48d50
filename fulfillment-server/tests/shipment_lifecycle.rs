//! Shipment tracker: assignment, pickup, delivery, failures, closing

mod common;

use common::*;
use fulfillment_server::db::repository::fleet;
use fulfillment_server::fulfillment::address;
use fulfillment_server::shipping::ShipmentError;
use shared::models::{
    DeliveryType, FailedAttemptInput, FailureReason, GeoPoint, OrderStatus, ProofInput, Shipment,
    ShipmentStatus, TransportEventType, VehicleStatus,
};

fn proof(recipient: &str) -> ProofInput {
    ProofInput {
        recipient_name: recipient.to_string(),
        recipient_document: Some("CC 1020304050".to_string()),
        signature_ref: Some("sig/abc.png".to_string()),
        photo_ref: None,
        notes: None,
        geo: Some(GeoPoint {
            latitude: 4.6,
            longitude: -74.08,
        }),
    }
}

fn failure(reason: FailureReason) -> FailedAttemptInput {
    FailedAttemptInput {
        reason,
        notes: None,
        geo: None,
        photo_ref: None,
    }
}

/// Confirmed self-delivery order and its pending shipment
async fn confirmed_shipment(state: &fulfillment_server::ServerState) -> Shipment {
    let order = create_order(state, order_payload("WO-2001", DeliveryType::SelfDelivery)).await;
    let outcome = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap();
    state
        .tracker
        .get(SCOPE, outcome.shipment_id.unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_assign_pickup_deliver() {
    let state = state().await;
    let shipment = confirmed_shipment(&state).await;
    let v1 = vehicle(&state, "ABC123").await;
    let d1 = driver(&state, "Carlos").await;

    let assigned = state
        .tracker
        .assign(SCOPE, shipment.id, v1.id, d1.id, None, CASHIER)
        .await
        .unwrap();
    assert_eq!(assigned.status, ShipmentStatus::Assigned);
    assert_eq!(assigned.vehicle_id, Some(v1.id));
    assert_eq!(assigned.driver_id, Some(d1.id));
    let busy = fleet::find_vehicle(state.pool(), SCOPE, v1.id).await.unwrap().unwrap();
    assert_eq!(busy.status, VehicleStatus::InUse);
    assert_eq!(busy.current_driver_id, Some(d1.id));

    let picked = state
        .tracker
        .mark_picked_up(SCOPE, shipment.id, d1.id, None)
        .await
        .unwrap();
    assert_eq!(picked.status, ShipmentStatus::OutForDelivery);
    assert!(picked.picked_up_at.is_some());
    let order = state
        .collaborators
        .orders
        .get(SCOPE, shipment.source_id)
        .await
        .unwrap()
        .unwrap()
        .order;
    assert_eq!(order.status, OrderStatus::InDelivery);

    let delivery = state
        .tracker
        .mark_delivered(SCOPE, shipment.id, d1.id, proof("Jane Doe"))
        .await
        .unwrap();
    assert_eq!(delivery.shipment.status, ShipmentStatus::Delivered);
    assert_eq!(delivery.proof.recipient_name, "Jane Doe");
    assert_eq!(delivery.proof.captured_by, d1.id);

    let stored = state.tracker.proof(SCOPE, shipment.id).await.unwrap().unwrap();
    assert_eq!(stored.id, delivery.proof.id);

    let v1 = fleet::find_vehicle(state.pool(), SCOPE, v1.id).await.unwrap().unwrap();
    assert_eq!(v1.status, VehicleStatus::Available);
    assert_eq!(v1.current_driver_id, None);

    let order = state
        .collaborators
        .orders
        .get(SCOPE, shipment.source_id)
        .await
        .unwrap()
        .unwrap()
        .order;
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.delivered_at.is_some());

    let events: Vec<TransportEventType> = state
        .tracker
        .events(SCOPE, shipment.id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(
        events,
        vec![
            TransportEventType::Created,
            TransportEventType::Assigned,
            TransportEventType::PickedUp,
            TransportEventType::Delivered,
        ]
    );
}

#[tokio::test]
async fn test_create_from_order_is_idempotent() {
    let state = state().await;
    let shipment = confirmed_shipment(&state).await;
    let order = state
        .collaborators
        .orders
        .get(SCOPE, shipment.source_id)
        .await
        .unwrap()
        .unwrap()
        .order;

    let again = state
        .tracker
        .create_from_order(
            SCOPE,
            &order,
            address::normalize(&order.delivery_address),
            None,
            CASHIER,
        )
        .await
        .unwrap();
    assert_eq!(again.id, shipment.id);
    assert_eq!(again.tracking_number, shipment.tracking_number);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM shipment").await, 1);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM transport_event").await, 1);
}

#[tokio::test]
async fn test_pickup_order_has_no_shipment() {
    let state = state().await;
    let order = pickup_order(&state).await;
    let err = state
        .tracker
        .create_from_order(
            SCOPE,
            &order.order,
            address::normalize(&order.order.delivery_address),
            None,
            CASHIER,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShipmentError::NotSelfDelivery(_)));
}

#[tokio::test]
async fn test_delivered_shipment_refuses_further_moves() {
    let state = state().await;
    let shipment = confirmed_shipment(&state).await;
    let v1 = vehicle(&state, "ABC123").await;
    let d1 = driver(&state, "Carlos").await;
    state
        .tracker
        .assign(SCOPE, shipment.id, v1.id, d1.id, None, CASHIER)
        .await
        .unwrap();
    state
        .tracker
        .mark_picked_up(SCOPE, shipment.id, d1.id, None)
        .await
        .unwrap();
    state
        .tracker
        .mark_delivered(SCOPE, shipment.id, d1.id, proof("Jane Doe"))
        .await
        .unwrap();

    let err = state
        .tracker
        .assign(SCOPE, shipment.id, v1.id, d1.id, None, CASHIER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShipmentError::InvalidTransition {
            from: ShipmentStatus::Delivered,
            to: ShipmentStatus::Assigned,
            ..
        }
    ));

    let err = state
        .tracker
        .cancel(SCOPE, shipment.id, CASHIER, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ShipmentError::InvalidTransition { .. }));

    let err = state
        .tracker
        .register_failed_attempt(SCOPE, shipment.id, d1.id, failure(FailureReason::Refused))
        .await
        .unwrap_err();
    assert!(matches!(err, ShipmentError::InvalidTransition { .. }));

    assert_eq!(count(&state, "SELECT COUNT(*) FROM proof_of_delivery").await, 1);
}

#[tokio::test]
async fn test_deliver_requires_pickup_and_recipient() {
    let state = state().await;
    let shipment = confirmed_shipment(&state).await;

    let err = state
        .tracker
        .mark_delivered(SCOPE, shipment.id, 1, proof("Jane Doe"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShipmentError::InvalidTransition {
            from: ShipmentStatus::Pending,
            to: ShipmentStatus::Delivered,
            ..
        }
    ));

    let err = state
        .tracker
        .mark_delivered(SCOPE, shipment.id, 1, proof("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, ShipmentError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_failed_attempts_are_numbered() {
    let state = state().await;
    let shipment = confirmed_shipment(&state).await;
    let v1 = vehicle(&state, "ABC123").await;
    let d1 = driver(&state, "Carlos").await;
    state
        .tracker
        .assign(SCOPE, shipment.id, v1.id, d1.id, None, CASHIER)
        .await
        .unwrap();
    state
        .tracker
        .mark_picked_up(SCOPE, shipment.id, d1.id, None)
        .await
        .unwrap();

    let first = state
        .tracker
        .register_failed_attempt(
            SCOPE,
            shipment.id,
            d1.id,
            failure(FailureReason::CustomerAbsent),
        )
        .await
        .unwrap();
    let second = state
        .tracker
        .register_failed_attempt(SCOPE, shipment.id, d1.id, failure(FailureReason::WrongAddress))
        .await
        .unwrap();
    assert_eq!(first.attempt_number, 1);
    assert_eq!(second.attempt_number, 2);

    // status unchanged by failed attempts
    let current = state.tracker.get(SCOPE, shipment.id).await.unwrap();
    assert_eq!(current.status, ShipmentStatus::OutForDelivery);

    let attempts = state.tracker.attempts(SCOPE, shipment.id).await.unwrap();
    assert_eq!(attempts.len(), 2);

    let returned = state
        .tracker
        .mark_returned(SCOPE, shipment.id, CASHIER, Some("two failed attempts".into()))
        .await
        .unwrap();
    assert_eq!(returned.status, ShipmentStatus::Returned);
    let v1 = fleet::find_vehicle(state.pool(), SCOPE, v1.id).await.unwrap().unwrap();
    assert_eq!(v1.status, VehicleStatus::Available);
}

#[tokio::test]
async fn test_reassignment_releases_previous_vehicle() {
    let state = state().await;
    let shipment = confirmed_shipment(&state).await;
    let v1 = vehicle(&state, "ABC123").await;
    let v2 = vehicle(&state, "XYZ789").await;
    let d1 = driver(&state, "Carlos").await;

    state
        .tracker
        .assign(SCOPE, shipment.id, v1.id, d1.id, None, CASHIER)
        .await
        .unwrap();
    let reassigned = state
        .tracker
        .assign(SCOPE, shipment.id, v2.id, d1.id, None, CASHIER)
        .await
        .unwrap();
    assert_eq!(reassigned.vehicle_id, Some(v2.id));

    let v1 = fleet::find_vehicle(state.pool(), SCOPE, v1.id).await.unwrap().unwrap();
    let v2 = fleet::find_vehicle(state.pool(), SCOPE, v2.id).await.unwrap().unwrap();
    assert_eq!(v1.status, VehicleStatus::Available);
    assert_eq!(v2.status, VehicleStatus::InUse);
}

#[tokio::test]
async fn test_vehicle_in_maintenance_cannot_be_assigned() {
    let state = state().await;
    let shipment = confirmed_shipment(&state).await;
    let v1 = vehicle(&state, "ABC123").await;
    let d1 = driver(&state, "Carlos").await;
    fleet::set_vehicle_status(state.pool(), SCOPE, v1.id, VehicleStatus::Maintenance)
        .await
        .unwrap();

    let err = state
        .tracker
        .assign(SCOPE, shipment.id, v1.id, d1.id, None, CASHIER)
        .await
        .unwrap_err();
    assert!(matches!(err, ShipmentError::VehicleUnavailable { .. }));

    let unchanged = state.tracker.get(SCOPE, shipment.id).await.unwrap();
    assert_eq!(unchanged.status, ShipmentStatus::Pending);
}

#[tokio::test]
async fn test_cancel_order_cancels_shipment_and_frees_vehicle() {
    let state = state().await;
    let shipment = confirmed_shipment(&state).await;
    let v1 = vehicle(&state, "ABC123").await;
    let d1 = driver(&state, "Carlos").await;
    state
        .tracker
        .assign(SCOPE, shipment.id, v1.id, d1.id, None, CASHIER)
        .await
        .unwrap();

    let cancellation = state
        .orchestrator
        .cancel_order(SCOPE, shipment.source_id, CASHIER, Some("out of stock".into()))
        .await
        .unwrap();
    assert_eq!(cancellation.order.status, OrderStatus::Cancelled);
    assert_eq!(
        cancellation.order.cancellation_reason.as_deref(),
        Some("out of stock")
    );
    assert_eq!(cancellation.shipment_id, Some(shipment.id));

    let cancelled = state.tracker.get(SCOPE, shipment.id).await.unwrap();
    assert_eq!(cancelled.status, ShipmentStatus::Cancelled);
    let v1 = fleet::find_vehicle(state.pool(), SCOPE, v1.id).await.unwrap().unwrap();
    assert_eq!(v1.status, VehicleStatus::Available);
}

#[tokio::test]
async fn test_dispatch_board_and_stats() {
    let state = state().await;
    let from = shared::util::now_millis() - 60_000;
    let shipment = confirmed_shipment(&state).await;
    let v1 = vehicle(&state, "ABC123").await;
    driver(&state, "Carlos").await;

    let board = state.tracker.dispatch_board(SCOPE).await.unwrap();
    assert_eq!(board.vehicles.len(), 1);
    assert_eq!(board.vehicles[0].id, v1.id);
    assert_eq!(board.drivers.len(), 1);
    assert_eq!(board.unassigned.len(), 1);
    assert_eq!(board.unassigned[0].id, shipment.id);

    let stats = state
        .tracker
        .delivery_stats(SCOPE, from, shared::util::now_millis() + 60_000)
        .await
        .unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.avg_delivery_minutes, None);

    let err = state
        .tracker
        .delivery_stats(SCOPE, 10, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ShipmentError::InvalidRequest(_)));
}
