//! Find-or-create against records the ordering front-end may have pre-created
//!
//! 前端可能已经写入了小费 / 优惠券核销的占位记录 (sale_id 为空或暂存订单 id)。
//! 确认时先找占位记录并原地更新，找不到才新建，保证每个订单只有一条。

use shared::Scope;
use shared::models::{
    CouponRedemption, Gratuity, GratuityCreate, GratuityLink, OnlineOrder, RedemptionCreate,
    TipType,
};

use crate::db::repository::RepoResult;
use crate::orders::money;
use crate::stores::{CouponLedger, GratuityLedger};

/// Link the order's tip to `sale_id`, creating it when no record exists
///
/// Lookup order: `source_order_id`, then the order number inside `notes`
/// (a placeholder with the order's tip amount wins over older ones).
pub async fn reconcile_gratuity(
    ledger: &dyn GratuityLedger,
    scope: Scope,
    order: &OnlineOrder,
    sale_id: i64,
    actor_id: i64,
) -> RepoResult<Gratuity> {
    let existing = match ledger.find_by_source_order(scope, order.id).await? {
        Some(g) => Some(g),
        None => pick_by_amount(
            ledger
                .find_by_order_number(scope, &order.order_number)
                .await?,
            order.tip_amount,
        ),
    };

    if let Some(gratuity) = existing {
        // already linked to a sale: never re-point it
        if gratuity.sale_id.is_some() {
            return Ok(gratuity);
        }
        tracing::debug!(
            target: "fulfillment",
            order_id = order.id,
            gratuity_id = gratuity.id,
            placeholder = gratuity.is_upstream_placeholder(),
            "Linking existing gratuity to sale"
        );
        let link = GratuityLink {
            sale_id,
            source_order_id: order.id,
            recorded_by: actor_id,
        };
        return ledger.link(scope, gratuity.id, &link).await;
    }

    ledger
        .create(
            scope,
            &GratuityCreate {
                sale_id: Some(sale_id),
                source_order_id: Some(order.id),
                amount: order.tip_amount,
                tip_type: TipType::Online,
                recorded_by: actor_id,
                notes: Some(format!("Online order {}", order.order_number)),
            },
        )
        .await
}

fn pick_by_amount(mut candidates: Vec<Gratuity>, amount: f64) -> Option<Gratuity> {
    let i = candidates
        .iter()
        .position(|g| money::money_eq(g.amount, amount))
        .unwrap_or(0);
    (i < candidates.len()).then(|| candidates.swap_remove(i))
}

/// Redeem the order's coupon against `sale_id`
///
/// Returns `Ok(None)` when the code is unknown or the coupon is not active.
/// A placeholder (sale_id == order id) is re-pointed without touching
/// `usage_count`; a fresh redemption increments it.
pub async fn reconcile_coupon(
    ledger: &dyn CouponLedger,
    scope: Scope,
    order: &OnlineOrder,
    sale_id: i64,
    now: i64,
) -> RepoResult<Option<CouponRedemption>> {
    let Some(code) = order.coupon() else {
        return Ok(None);
    };

    let coupon = match ledger.find_by_code(scope, code).await? {
        Some(c) if c.is_active_at(now) => c,
        Some(c) => {
            tracing::info!(
                target: "fulfillment",
                order_id = order.id,
                coupon_id = c.id,
                code,
                "Coupon inactive, skipping redemption"
            );
            return Ok(None);
        }
        None => {
            tracing::info!(target: "fulfillment", order_id = order.id, code, "Coupon not found, skipping redemption");
            return Ok(None);
        }
    };

    if let Some(linked) = ledger.find_redemption(scope, coupon.id, sale_id).await? {
        return Ok(Some(linked));
    }

    if let Some(placeholder) = ledger.find_redemption(scope, coupon.id, order.id).await? {
        let relinked = ledger
            .relink_redemption(scope, placeholder.id, sale_id)
            .await?;
        return Ok(Some(relinked));
    }

    let redemption = ledger
        .redeem(
            scope,
            &RedemptionCreate {
                coupon_id: coupon.id,
                sale_id,
                customer_id: order.customer_id,
                discount_amount: order.discount_amount,
            },
        )
        .await?;
    Ok(Some(redemption))
}
