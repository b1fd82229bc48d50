//! Online Order Repository

use super::{RepoError, RepoResult};
use crate::orders::money;
use shared::Scope;
use shared::models::{
    OnlineOrder, OnlineOrderCreate, OnlineOrderDetail, OnlineOrderItem, OrderConfirmation,
    OrderStatus, OrderStatusUpdate,
};
use sqlx::SqlitePool;
use sqlx::types::Json;

const ORDER_COLUMNS: &str = "id, organization_id, branch_id, order_number, channel, customer_id, customer_name, customer_phone, customer_email, delivery_type, delivery_address, is_scheduled, scheduled_for, payment_status, payment_method, subtotal, tax_amount, discount_amount, delivery_fee, tip_amount, total, coupon_code, notes, status, sale_id, confirmed_at, confirmed_by, estimated_ready_at, estimated_delivery_at, ready_at, dispatched_at, delivered_at, cancelled_at, cancellation_reason, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, unit_price, tax_amount, discount_amount, line_total, modifiers, notes";

pub async fn find_by_id(pool: &SqlitePool, scope: Scope, id: i64) -> RepoResult<Option<OnlineOrder>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM online_order WHERE id = ? AND organization_id = ? AND branch_id = ?"
    );
    let order = sqlx::query_as::<_, OnlineOrder>(&sql)
        .bind(id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_optional(pool)
        .await?;
    Ok(order)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OnlineOrderItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM online_order_item WHERE order_id = ? ORDER BY id");
    let items = sqlx::query_as::<_, OnlineOrderItem>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(items)
}

pub async fn find_detail(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
) -> RepoResult<Option<OnlineOrderDetail>> {
    let Some(order) = find_by_id(pool, scope, id).await? else {
        return Ok(None);
    };
    let items = find_items(pool, order.id).await?;
    Ok(Some(OnlineOrderDetail { order, items }))
}

/// Insert order + items in one transaction (intake from the ordering front-end)
pub async fn create(
    pool: &SqlitePool,
    scope: Scope,
    data: OnlineOrderCreate,
) -> RepoResult<OnlineOrderDetail> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO online_order (id, organization_id, branch_id, order_number, channel, customer_id, customer_name, customer_phone, customer_email, delivery_type, delivery_address, is_scheduled, scheduled_for, payment_status, payment_method, subtotal, tax_amount, discount_amount, delivery_fee, tip_amount, total, coupon_code, notes, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, 'pending', ?24, ?24)",
    )
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(&data.order_number)
    .bind(data.channel)
    .bind(data.customer_id)
    .bind(&data.customer_name)
    .bind(&data.customer_phone)
    .bind(&data.customer_email)
    .bind(data.delivery_type)
    .bind(Json(&data.delivery_address))
    .bind(data.is_scheduled)
    .bind(data.scheduled_for)
    .bind(data.payment_status)
    .bind(&data.payment_method)
    .bind(data.subtotal)
    .bind(data.tax_amount)
    .bind(data.discount_amount)
    .bind(data.delivery_fee)
    .bind(data.tip_amount)
    .bind(data.total)
    .bind(&data.coupon_code)
    .bind(&data.notes)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for item in &data.items {
        let line_total = money::line_total(
            item.quantity,
            item.unit_price,
            item.discount_amount,
            item.tax_amount,
        );
        sqlx::query(
            "INSERT INTO online_order_item (id, order_id, product_id, product_name, quantity, unit_price, tax_amount, discount_amount, line_total, modifiers, notes) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(shared::util::snowflake_id())
        .bind(id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.tax_amount)
        .bind(item.discount_amount)
        .bind(line_total)
        .bind(Json(&item.modifiers))
        .bind(&item.notes)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    find_detail(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create online order".into()))
}

/// Final confirmation write
///
/// Refuses to replace a different, already linked sale.
pub async fn finalize(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    data: &OrderConfirmation,
) -> RepoResult<OnlineOrder> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE online_order SET status = ?1, sale_id = ?2, confirmed_at = ?3, confirmed_by = ?4, estimated_ready_at = ?5, estimated_delivery_at = COALESCE(?6, estimated_delivery_at), updated_at = ?7 WHERE id = ?8 AND organization_id = ?9 AND branch_id = ?10 AND (sale_id IS NULL OR sale_id = ?2)",
    )
    .bind(OrderStatus::Confirmed)
    .bind(data.sale_id)
    .bind(data.confirmed_at)
    .bind(data.confirmed_by)
    .bind(data.estimated_ready_at)
    .bind(data.estimated_delivery_at)
    .bind(now)
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return match find_by_id(pool, scope, id).await? {
            Some(existing) => Err(RepoError::SaleLinked(format!(
                "Order {id} is already linked to sale {}",
                existing.sale_id.unwrap_or_default()
            ))),
            None => Err(RepoError::NotFound(format!("Online order {id} not found"))),
        };
    }
    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Online order {id} not found")))
}

/// Partial status update, unset fields keep their value
pub async fn update_status(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    data: &OrderStatusUpdate,
) -> RepoResult<OnlineOrder> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE online_order SET status = COALESCE(?1, status), confirmed_at = COALESCE(?2, confirmed_at), ready_at = COALESCE(?3, ready_at), dispatched_at = COALESCE(?4, dispatched_at), delivered_at = COALESCE(?5, delivered_at), cancelled_at = COALESCE(?6, cancelled_at), cancellation_reason = COALESCE(?7, cancellation_reason), updated_at = ?8 WHERE id = ?9 AND organization_id = ?10 AND branch_id = ?11",
    )
    .bind(data.status)
    .bind(data.confirmed_at)
    .bind(data.ready_at)
    .bind(data.dispatched_at)
    .bind(data.delivered_at)
    .bind(data.cancelled_at)
    .bind(&data.cancellation_reason)
    .bind(now)
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Online order {id} not found")));
    }
    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Online order {id} not found")))
}
