//! Fulfillment Orchestrator
//!
//! 确认流程 (无跨表事务，每步独立提交):
//!
//! ```text
//! Sale → SaleItems → Ticket → Gratuity? → Coupon? → Shipment? → Finalize
//! └────── hard ──────────┘   └──────── soft ────────┘           hard
//! ```
//!
//! Hard 步骤失败立即返回，已提交的记录保留给对账报表；
//! Soft 步骤失败记录日志并跳过，确认继续。

use serde::Serialize;
use shared::Scope;
use shared::models::{
    DeliveryType, OnlineOrder, OnlineOrderDetail, OrderConfirmation, OrderStatus,
    ProductionTicketCreate, SaleCreate, SaleItemCreate, SaleItemRef, TicketItemCreate,
};

use super::error::{FulfillmentError, FulfillmentStep};
use super::{address, reconcile};
use crate::db::repository::RepoError;
use crate::orders::{OrderError, OrderStatusMachine, money};
use crate::shipping::{ShipmentError, ShipmentTracker};
use crate::stores::Collaborators;

const MINUTE_MS: i64 = 60_000;

/// 预计出餐时间上限 (一天)
pub const MAX_ESTIMATED_MINUTES: i64 = 1440;

/// Caller-supplied confirmation parameters
#[derive(Debug, Clone, Copy)]
pub struct ConfirmOptions {
    /// Preparation estimate
    pub estimated_minutes: i64,
    /// Employee confirming the order
    pub actor_id: i64,
}

/// A soft step that failed and was skipped
#[derive(Debug, Clone, Serialize)]
pub struct DegradedStep {
    pub step: FulfillmentStep,
    pub error: String,
}

/// Ids produced by a confirmation
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationOutcome {
    pub order_id: i64,
    pub sale_id: i64,
    pub ticket_id: i64,
    pub tip_id: Option<i64>,
    pub shipment_id: Option<i64>,
    pub redemption_id: Option<i64>,
    pub estimated_ready_at: i64,
    pub estimated_delivery_at: Option<i64>,
    pub degraded_steps: Vec<DegradedStep>,
}

/// Result of cancelling an order
#[derive(Debug, Clone, Serialize)]
pub struct Cancellation {
    pub order: OnlineOrder,
    /// Shipment cancelled alongside the order
    pub shipment_id: Option<i64>,
}

/// Stateless coordinator over the collaborators
#[derive(Clone)]
pub struct Orchestrator {
    collaborators: Collaborators,
    tracker: ShipmentTracker,
    order_status: OrderStatusMachine,
    delivery_buffer_minutes: i64,
}

impl Orchestrator {
    pub fn new(
        collaborators: Collaborators,
        tracker: ShipmentTracker,
        delivery_buffer_minutes: i64,
    ) -> Self {
        let order_status = OrderStatusMachine::new(collaborators.orders.clone());
        Self {
            collaborators,
            tracker,
            order_status,
            delivery_buffer_minutes,
        }
    }

    /// Load the order, then [`Self::confirm`]
    pub async fn confirm_by_id(
        &self,
        scope: Scope,
        order_id: i64,
        options: ConfirmOptions,
    ) -> Result<ConfirmationOutcome, FulfillmentError> {
        let detail = self
            .collaborators
            .orders
            .get(scope, order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;
        self.confirm(&detail, options).await
    }

    /// Confirm a pending order
    pub async fn confirm(
        &self,
        detail: &OnlineOrderDetail,
        options: ConfirmOptions,
    ) -> Result<ConfirmationOutcome, FulfillmentError> {
        let order = &detail.order;
        let scope = order.scope();

        if !order.status.is_pre_confirmation() || order.sale_id.is_some() {
            return Err(FulfillmentError::NotConfirmable {
                order_id: order.id,
                status: order.status,
                sale_id: order.sale_id,
            });
        }
        if detail.items.is_empty() {
            return Err(FulfillmentError::EmptyOrder(order.id));
        }
        if !(1..=MAX_ESTIMATED_MINUTES).contains(&options.estimated_minutes) {
            return Err(FulfillmentError::InvalidEstimate {
                minutes: options.estimated_minutes,
                max: MAX_ESTIMATED_MINUTES,
            });
        }

        let now = shared::util::now_millis();
        let estimated_ready_at = now + options.estimated_minutes * MINUTE_MS;
        let estimated_delivery_at = (order.delivery_type != DeliveryType::Pickup).then(|| {
            estimated_ready_at
                .saturating_add(self.delivery_buffer_minutes.saturating_mul(MINUTE_MS))
        });

        tracing::info!(
            target: "fulfillment",
            order_id = order.id,
            order_number = %order.order_number,
            items = detail.items.len(),
            delivery_type = ?order.delivery_type,
            "Confirming order"
        );

        // 1-3: hard
        let sale = self
            .collaborators
            .sales
            .create_sale(scope, &sale_from_order(order, options.actor_id))
            .await
            .map_err(|e| hard_failure(order, FulfillmentStep::Sale, e))?;
        log_step(order, FulfillmentStep::Sale, sale.id);

        let sale_items = self
            .collaborators
            .sales
            .create_items(sale.id, &sale_items_from_order(detail))
            .await
            .map_err(|e| hard_failure(order, FulfillmentStep::SaleItems, e))?;
        log_step(order, FulfillmentStep::SaleItems, sale.id);

        let ticket_id = self
            .create_ticket(detail, sale.id, &sale_items)
            .await
            .map_err(|e| hard_failure(order, FulfillmentStep::Ticket, e))?;
        log_step(order, FulfillmentStep::Ticket, ticket_id);

        // 4-6: soft
        let mut degraded_steps = Vec::new();

        let tip_id = if order.has_tip() {
            let result = reconcile::reconcile_gratuity(
                self.collaborators.gratuities.as_ref(),
                scope,
                order,
                sale.id,
                options.actor_id,
            )
            .await
            .map(|g| Some(g.id));
            soft(order, FulfillmentStep::Gratuity, result, &mut degraded_steps)
        } else {
            None
        };

        let redemption_id = if order.coupon().is_some() {
            let result = reconcile::reconcile_coupon(
                self.collaborators.coupons.as_ref(),
                scope,
                order,
                sale.id,
                now,
            )
            .await
            .map(|r| r.map(|r| r.id));
            soft(order, FulfillmentStep::Coupon, result, &mut degraded_steps)
        } else {
            None
        };

        let shipment_id = if order.is_self_delivery() {
            let result = self
                .tracker
                .create_from_order(
                    scope,
                    order,
                    address::normalize(&order.delivery_address),
                    estimated_delivery_at,
                    options.actor_id,
                )
                .await
                .map(|s| Some(s.id));
            soft(order, FulfillmentStep::Shipment, result, &mut degraded_steps)
        } else {
            None
        };

        // 8: finalize
        let confirmation = OrderConfirmation {
            sale_id: sale.id,
            confirmed_at: now,
            confirmed_by: options.actor_id,
            estimated_ready_at,
            estimated_delivery_at,
        };
        if let Err(source) = self
            .collaborators
            .orders
            .finalize(scope, order.id, &confirmation)
            .await
        {
            tracing::error!(
                target: "fulfillment",
                order_id = order.id,
                order_number = %order.order_number,
                step = %FulfillmentStep::Finalize,
                sale_id = sale.id,
                ticket_id,
                error = %source,
                "Finalize failed after sale and ticket committed, needs reconciliation"
            );
            return Err(FulfillmentError::FinalizeFailed {
                order_id: order.id,
                sale_id: sale.id,
                ticket_id,
                source,
            });
        }

        tracing::info!(
            target: "fulfillment",
            order_id = order.id,
            order_number = %order.order_number,
            sale_id = sale.id,
            ticket_id,
            tip_id,
            redemption_id,
            shipment_id,
            degraded = degraded_steps.len(),
            "Order confirmed"
        );

        Ok(ConfirmationOutcome {
            order_id: order.id,
            sale_id: sale.id,
            ticket_id,
            tip_id,
            shipment_id,
            redemption_id,
            estimated_ready_at,
            estimated_delivery_at,
            degraded_steps,
        })
    }

    /// Cancel the order and any shipment still in flight
    ///
    /// Shipment cancellation is soft: the order stays cancelled when it fails.
    pub async fn cancel_order(
        &self,
        scope: Scope,
        order_id: i64,
        actor_id: i64,
        reason: Option<String>,
    ) -> Result<Cancellation, FulfillmentError> {
        let order = self
            .order_status
            .transition(
                scope,
                order_id,
                OrderStatus::Cancelled,
                shared::util::now_millis(),
                reason.clone(),
            )
            .await
            .map_err(|e| match e {
                OrderError::NotFound(id) => FulfillmentError::OrderNotFound(id),
                other => other.into(),
            })?;

        let shipment_id = match self.cancel_shipment(scope, order_id, actor_id, reason).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    target: "fulfillment",
                    order_id,
                    error = %e,
                    "Order cancelled but shipment cancellation failed"
                );
                None
            }
        };

        Ok(Cancellation { order, shipment_id })
    }

    async fn cancel_shipment(
        &self,
        scope: Scope,
        order_id: i64,
        actor_id: i64,
        reason: Option<String>,
    ) -> Result<Option<i64>, ShipmentError> {
        match self.tracker.find_for_order(scope, order_id).await? {
            Some(shipment) if !shipment.status.is_terminal() => {
                let cancelled = self
                    .tracker
                    .cancel(scope, shipment.id, actor_id, reason)
                    .await?;
                Ok(Some(cancelled.id))
            }
            _ => Ok(None),
        }
    }

    async fn create_ticket(
        &self,
        detail: &OnlineOrderDetail,
        sale_id: i64,
        sale_items: &[SaleItemRef],
    ) -> Result<i64, RepoError> {
        if sale_items.is_empty() {
            return Err(RepoError::Validation(format!(
                "Sale {sale_id} has no items to prepare"
            )));
        }
        let order = &detail.order;
        // create_items returns refs in input order
        let items: Vec<TicketItemCreate> = sale_items
            .iter()
            .zip(&detail.items)
            .map(|(sale_item, order_item)| TicketItemCreate {
                sale_item_id: sale_item.id,
                product_id: sale_item.product_id,
                product_name: order_item.product_name.clone(),
                quantity: order_item.quantity,
                notes: order_item.notes.clone(),
            })
            .collect();

        let ticket = self
            .collaborators
            .kitchen
            .create_ticket(
                order.scope(),
                &ProductionTicketCreate {
                    sale_id,
                    ticket_number: format!("KT-{}", order.order_number),
                    source: order.channel.as_str().to_string(),
                    notes: order.notes.clone(),
                },
                &items,
            )
            .await?;
        Ok(ticket.id)
    }
}

fn sale_from_order(order: &OnlineOrder, actor_id: i64) -> SaleCreate {
    SaleCreate {
        sale_number: format!("POS-{}", order.order_number),
        source_order_id: Some(order.id),
        channel: order.channel.as_str().to_string(),
        customer_id: order.customer_id,
        customer_name: Some(order.customer_name.clone()),
        subtotal: order.subtotal,
        tax_amount: order.tax_amount,
        discount_amount: order.discount_amount,
        delivery_fee: order.delivery_fee,
        tip_amount: order.tip_amount,
        total: order.total,
        payment_status: order.payment_status,
        payment_method: order.payment_method.clone(),
        created_by: actor_id,
    }
}

/// Sale lines re-priced from quantity, unit price, discount and tax
fn sale_items_from_order(detail: &OnlineOrderDetail) -> Vec<SaleItemCreate> {
    let order = &detail.order;
    detail
        .items
        .iter()
        .map(|item| {
            let line_total = money::line_total(
                item.quantity,
                item.unit_price,
                item.discount_amount,
                item.tax_amount,
            );
            if !money::money_eq(line_total, item.line_total) {
                tracing::warn!(
                    target: "fulfillment",
                    order_id = order.id,
                    item_id = item.id,
                    stored = item.line_total,
                    repriced = line_total,
                    "Order line total differs from re-priced total"
                );
            }
            SaleItemCreate {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                tax_amount: item.tax_amount,
                discount_amount: item.discount_amount,
                line_total,
                annotation: serde_json::json!({
                    "product_name": item.product_name,
                    "online_order_id": order.id,
                    "order_number": order.order_number,
                    "modifiers": item.modifiers,
                    "notes": item.notes,
                }),
            }
        })
        .collect()
}

fn log_step(order: &OnlineOrder, step: FulfillmentStep, id: i64) {
    tracing::debug!(
        target: "fulfillment",
        order_id = order.id,
        order_number = %order.order_number,
        step = %step,
        id,
        "Step committed"
    );
}

fn hard_failure(order: &OnlineOrder, step: FulfillmentStep, source: RepoError) -> FulfillmentError {
    tracing::error!(
        target: "fulfillment",
        order_id = order.id,
        order_number = %order.order_number,
        step = %step,
        error = %source,
        "Confirmation aborted"
    );
    FulfillmentError::Step { step, source }
}

/// Log and swallow a soft step failure
fn soft<E: std::fmt::Display>(
    order: &OnlineOrder,
    step: FulfillmentStep,
    result: Result<Option<i64>, E>,
    degraded: &mut Vec<DegradedStep>,
) -> Option<i64> {
    match result {
        Ok(id) => {
            if let Some(id) = id {
                log_step(order, step, id);
            }
            id
        }
        Err(e) => {
            tracing::warn!(
                target: "fulfillment",
                order_id = order.id,
                order_number = %order.order_number,
                step = %step,
                error = %e,
                "Soft step failed, continuing"
            );
            degraded.push(DegradedStep {
                step,
                error: e.to_string(),
            });
            None
        }
    }
}
