//! Order confirmation: records created per order type, placeholder reconciliation, preconditions

mod common;

use common::*;
use fulfillment_server::db::repository::{coupon, gratuity, kitchen, sale, shipment};
use fulfillment_server::ServerState;
use fulfillment_server::fulfillment::{FulfillmentError, MAX_ESTIMATED_MINUTES};
use fulfillment_server::shipping::SOURCE_ORDER;
use shared::models::{
    DeliveryType, GratuityCreate, OrderStatus, ShipmentStatus, TipType, UPSTREAM_ACTOR_ID,
};

#[tokio::test]
async fn test_pickup_order_creates_sale_and_ticket_only() {
    let state = state().await;
    let order = pickup_order(&state).await;

    let outcome = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap();

    assert!(outcome.degraded_steps.is_empty());
    assert_eq!(outcome.tip_id, None);
    assert_eq!(outcome.redemption_id, None);
    assert_eq!(outcome.shipment_id, None);
    assert_eq!(outcome.estimated_delivery_at, None);

    let sales = sale::find_by_source_order(state.pool(), SCOPE, order.order.id)
        .await
        .unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].id, outcome.sale_id);
    assert_eq!(sales[0].sale_number, "POS-WO-1001");
    assert_eq!(sale::find_items(state.pool(), outcome.sale_id).await.unwrap().len(), 2);

    let tickets = kitchen::find_by_sale(state.pool(), SCOPE, outcome.sale_id)
        .await
        .unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].ticket_number, "KT-WO-1001");

    assert_eq!(count(&state, "SELECT COUNT(*) FROM shipment").await, 0);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM gratuity").await, 0);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM coupon_redemption").await, 0);

    let confirmed = state
        .collaborators
        .orders
        .get(SCOPE, order.order.id)
        .await
        .unwrap()
        .unwrap()
        .order;
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert_eq!(confirmed.sale_id, Some(outcome.sale_id));
    assert_eq!(confirmed.confirmed_by, Some(CASHIER));
    assert_eq!(confirmed.estimated_ready_at, Some(outcome.estimated_ready_at));
}

#[tokio::test]
async fn test_delivery_order_with_tip_and_coupon() {
    let state = state().await;
    let save10 = save10(&state).await;
    let order = delivery_order(&state).await;

    let outcome = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap();
    assert!(outcome.degraded_steps.is_empty());

    // shipment, pending, estimated 15 min after ready
    let created = shipment::find_by_source(state.pool(), SCOPE, SOURCE_ORDER, order.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Some(created.id), outcome.shipment_id);
    assert_eq!(created.status, ShipmentStatus::Pending);
    assert_eq!(created.city.as_deref(), Some("Bogotá"));
    assert_eq!(created.region.as_deref(), Some("Cundinamarca"));
    assert_eq!(
        outcome.estimated_delivery_at,
        Some(outcome.estimated_ready_at + 15 * 60_000)
    );

    // gratuity linked to the sale
    let tip = gratuity::find_by_source_order(state.pool(), SCOPE, order.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Some(tip.id), outcome.tip_id);
    assert_eq!(tip.sale_id, Some(outcome.sale_id));
    assert_eq!(tip.amount, 5000.0);
    assert_eq!(tip.tip_type, TipType::Online);

    // redemption linked to the sale, usage counted once
    let redemption = coupon::find_redemption(state.pool(), 1, save10.id, outcome.sale_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Some(redemption.id), outcome.redemption_id);
    let save10 = coupon::find_by_id(state.pool(), 1, save10.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(save10.usage_count, 1);

    assert_eq!(count(&state, "SELECT COUNT(*) FROM sale").await, 1);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM production_ticket").await, 1);
}

#[tokio::test]
async fn test_confirm_twice_is_rejected_without_new_records() {
    let state = state().await;
    let order = delivery_order(&state).await;

    state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap();
    let err = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FulfillmentError::NotConfirmable {
            status: OrderStatus::Confirmed,
            sale_id: Some(_),
            ..
        }
    ));
    assert_eq!(count(&state, "SELECT COUNT(*) FROM sale").await, 1);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM production_ticket").await, 1);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM shipment").await, 1);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM gratuity").await, 1);
}

#[tokio::test]
async fn test_cancelled_order_cannot_be_confirmed() {
    let state = state().await;
    let order = pickup_order(&state).await;
    state
        .orchestrator
        .cancel_order(SCOPE, order.order.id, CASHIER, Some("customer called".into()))
        .await
        .unwrap();

    let err = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FulfillmentError::NotConfirmable {
            status: OrderStatus::Cancelled,
            sale_id: None,
            ..
        }
    ));
    assert_eq!(count(&state, "SELECT COUNT(*) FROM sale").await, 0);
}

#[tokio::test]
async fn test_unknown_order() {
    let state = state().await;
    let err = state
        .orchestrator
        .confirm_by_id(SCOPE, 999, options())
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::OrderNotFound(999)));
}

#[tokio::test]
async fn test_order_from_other_branch_is_invisible() {
    let state = state().await;
    let order = pickup_order(&state).await;
    let other_branch = shared::Scope::new(1, 2);

    let err = state
        .orchestrator
        .confirm_by_id(other_branch, order.order.id, options())
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::OrderNotFound(_)));
}

#[tokio::test]
async fn test_empty_order_rejected_before_any_write() {
    let state = state().await;
    let mut data = order_payload("WO-1003", DeliveryType::Pickup);
    data.items.clear();
    let order = create_order(&state, data).await;

    let err = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::EmptyOrder(_)));
    assert_eq!(count(&state, "SELECT COUNT(*) FROM sale").await, 0);
}

#[tokio::test]
async fn test_out_of_range_estimate_rejected_before_any_write() {
    let state = state().await;
    let order = create_order(&state, order_payload("WO-1004", DeliveryType::SelfDelivery)).await;

    for minutes in [0, -5, MAX_ESTIMATED_MINUTES + 1, i64::MAX] {
        let mut opts = options();
        opts.estimated_minutes = minutes;
        let err = state
            .orchestrator
            .confirm_by_id(SCOPE, order.order.id, opts)
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::InvalidEstimate { minutes: m, .. } if m == minutes));
    }
    assert_eq!(count(&state, "SELECT COUNT(*) FROM sale").await, 0);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM shipment").await, 0);

    // 上限本身可用
    let mut opts = options();
    opts.estimated_minutes = MAX_ESTIMATED_MINUTES;
    state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, opts)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_coupon_placeholder_is_relinked_without_counting_again() {
    let state = state().await;
    let save10 = save10(&state).await;
    let order = delivery_order(&state).await;

    // front-end already redeemed against the order id and counted the use
    sqlx::query(
        "INSERT INTO coupon_redemption (id, organization_id, coupon_id, sale_id, customer_id, discount_amount, redeemed_at) VALUES (?, 1, ?, ?, 7, 3600, 0)",
    )
    .bind(shared::util::snowflake_id())
    .bind(save10.id)
    .bind(order.order.id)
    .execute(state.pool())
    .await
    .unwrap();
    sqlx::query("UPDATE coupon SET usage_count = usage_count + 1 WHERE id = ?")
        .bind(save10.id)
        .execute(state.pool())
        .await
        .unwrap();

    let outcome = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap();

    assert_eq!(coupon::count_redemptions(state.pool(), save10.id).await.unwrap(), 1);
    let redemption = coupon::find_redemption(state.pool(), 1, save10.id, outcome.sale_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Some(redemption.id), outcome.redemption_id);
    let save10 = coupon::find_by_id(state.pool(), 1, save10.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(save10.usage_count, 1);
}

#[tokio::test]
async fn test_inactive_coupon_is_skipped_quietly() {
    let state = state().await;
    let save10 = save10(&state).await;
    coupon::set_active(state.pool(), 1, save10.id, false)
        .await
        .unwrap();
    let order = delivery_order(&state).await;

    let outcome = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap();
    assert_eq!(outcome.redemption_id, None);
    assert!(outcome.degraded_steps.is_empty());
    assert_eq!(count(&state, "SELECT COUNT(*) FROM coupon_redemption").await, 0);
}

#[tokio::test]
async fn test_gratuity_placeholder_is_linked_not_duplicated() {
    let state = state().await;
    let order = delivery_order(&state).await;
    let placeholder = gratuity::create(
        state.pool(),
        SCOPE,
        &GratuityCreate {
            sale_id: None,
            source_order_id: Some(order.order.id),
            amount: 5000.0,
            tip_type: TipType::Online,
            recorded_by: UPSTREAM_ACTOR_ID,
            notes: Some("Online order WO-1002".to_string()),
        },
    )
    .await
    .unwrap();

    let outcome = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap();

    assert_eq!(outcome.tip_id, Some(placeholder.id));
    assert_eq!(count(&state, "SELECT COUNT(*) FROM gratuity").await, 1);
    let linked = gratuity::find_by_id(state.pool(), SCOPE, placeholder.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.sale_id, Some(outcome.sale_id));
    assert_eq!(linked.recorded_by, CASHIER);
}

#[tokio::test]
async fn test_gratuity_found_by_order_number() {
    let state = state().await;
    let order = delivery_order(&state).await;
    let placeholder = gratuity::create(
        state.pool(),
        SCOPE,
        &GratuityCreate {
            sale_id: None,
            source_order_id: None,
            amount: 5000.0,
            tip_type: TipType::Online,
            recorded_by: UPSTREAM_ACTOR_ID,
            notes: Some("Tip for WO-1002".to_string()),
        },
    )
    .await
    .unwrap();

    let outcome = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap();

    assert_eq!(outcome.tip_id, Some(placeholder.id));
    let linked = gratuity::find_by_id(state.pool(), SCOPE, placeholder.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.source_order_id, Some(order.order.id));
}

async fn tipped_order(state: &ServerState, number: &str, tip: f64) -> i64 {
    let mut data = order_payload(number, DeliveryType::Pickup);
    data.tip_amount = tip;
    data.total += tip;
    create_order(state, data).await.order.id
}

async fn tip_placeholder(state: &ServerState, amount: f64, notes: &str) -> i64 {
    gratuity::create(
        state.pool(),
        SCOPE,
        &GratuityCreate {
            sale_id: None,
            source_order_id: None,
            amount,
            tip_type: TipType::Online,
            recorded_by: UPSTREAM_ACTOR_ID,
            notes: Some(notes.to_string()),
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn test_order_number_prefix_does_not_claim_other_placeholder() {
    let state = state().await;
    let short = tipped_order(&state, "WO-100", 1000.0).await;
    let long = tipped_order(&state, "WO-1001", 7000.0).await;
    // older placeholder whose number extends the shorter one
    let long_tip = tip_placeholder(&state, 7000.0, "Tip for WO-1001").await;
    let short_tip = tip_placeholder(&state, 1000.0, "Tip for WO-100").await;

    let first = state
        .orchestrator
        .confirm_by_id(SCOPE, short, options())
        .await
        .unwrap();
    let second = state
        .orchestrator
        .confirm_by_id(SCOPE, long, options())
        .await
        .unwrap();

    assert_eq!(first.tip_id, Some(short_tip));
    assert_eq!(second.tip_id, Some(long_tip));
    assert_eq!(count(&state, "SELECT COUNT(*) FROM gratuity").await, 2);
    assert_eq!(
        count(&state, "SELECT COUNT(*) FROM gratuity WHERE sale_id IS NULL").await,
        0
    );
}

#[tokio::test]
async fn test_placeholder_with_matching_amount_preferred() {
    let state = state().await;
    let order = tipped_order(&state, "WO-2001", 4000.0).await;
    let stale = tip_placeholder(&state, 2500.0, "WO-2001 draft").await;
    let current = tip_placeholder(&state, 4000.0, "WO-2001").await;

    let outcome = state
        .orchestrator
        .confirm_by_id(SCOPE, order, options())
        .await
        .unwrap();

    assert_eq!(outcome.tip_id, Some(current));
    let untouched = gratuity::find_by_id(state.pool(), SCOPE, stale)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.sale_id, None);
}

#[tokio::test]
async fn test_third_party_delivery_gets_estimate_but_no_shipment() {
    let state = state().await;
    let order = create_order(&state, order_payload("WO-1004", DeliveryType::ThirdParty)).await;

    let outcome = state
        .orchestrator
        .confirm_by_id(SCOPE, order.order.id, options())
        .await
        .unwrap();
    assert_eq!(outcome.shipment_id, None);
    assert!(outcome.estimated_delivery_at.is_some());
}
