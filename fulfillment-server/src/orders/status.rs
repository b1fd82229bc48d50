//! Order Status Machine
//!
//! Applies any requested target status and stamps the matching timestamp.
//! Jumps outside the lifecycle graph are logged, not refused.

use std::sync::Arc;

use shared::Scope;
use shared::models::{OnlineOrder, OrderStatus, OrderStatusUpdate};

use super::OrderError;
use crate::db::repository::RepoError;
use crate::stores::OrderStore;

#[derive(Clone)]
pub struct OrderStatusMachine {
    orders: Arc<dyn OrderStore>,
}

impl OrderStatusMachine {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Move `order_id` to `target` at time `at`
    ///
    /// `reason` is recorded for `cancelled` / `rejected`.
    pub async fn transition(
        &self,
        scope: Scope,
        order_id: i64,
        target: OrderStatus,
        at: i64,
        reason: Option<String>,
    ) -> Result<OnlineOrder, OrderError> {
        let current = self
            .orders
            .get(scope, order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?
            .order;

        if !current.status.can_transition_to(target) {
            tracing::warn!(
                target: "order_status",
                order_id,
                order_number = %current.order_number,
                from = %current.status,
                to = %target,
                "Order transition outside lifecycle, applying anyway"
            );
        }

        let update = stamp(target, at, reason);
        let updated = self
            .orders
            .update_status(scope, order_id, &update)
            .await
            .map_err(|e| match e {
                RepoError::NotFound(_) => OrderError::NotFound(order_id),
                other => OrderError::Repo(other),
            })?;

        tracing::info!(
            target: "order_status",
            order_id,
            order_number = %updated.order_number,
            from = %current.status,
            to = %updated.status,
            "Order status changed"
        );
        Ok(updated)
    }
}

/// Status + the timestamp field that belongs to it
fn stamp(target: OrderStatus, at: i64, reason: Option<String>) -> OrderStatusUpdate {
    let mut update = OrderStatusUpdate {
        status: Some(target),
        ..Default::default()
    };
    match target {
        OrderStatus::Pending | OrderStatus::Preparing => {}
        OrderStatus::Confirmed => update.confirmed_at = Some(at),
        OrderStatus::Ready => update.ready_at = Some(at),
        OrderStatus::InDelivery => update.dispatched_at = Some(at),
        OrderStatus::Delivered => update.delivered_at = Some(at),
        OrderStatus::Cancelled | OrderStatus::Rejected => {
            update.cancelled_at = Some(at);
            update.cancellation_reason = reason;
        }
    }
    update
}
