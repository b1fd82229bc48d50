//! Reconciliation queries
//!
//! Read-only checks that find records left inconsistent by partially
//! completed confirmations.

use super::RepoResult;
use serde::Serialize;
use shared::Scope;
use shared::models::{DeliveryType, OrderStatus, TipType};
use sqlx::SqlitePool;

/// Sale created for an order that never got linked to it
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrphanedSale {
    pub sale_id: i64,
    pub sale_number: String,
    pub source_order_id: i64,
    pub order_status: Option<OrderStatus>,
    pub linked_sale_id: Option<i64>,
    pub created_at: i64,
}

/// Sale without any production ticket
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SaleWithoutTicket {
    pub sale_id: i64,
    pub sale_number: String,
    pub source_order_id: Option<i64>,
    pub created_at: i64,
}

/// Confirmed order missing an auxiliary record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderGap {
    pub order_id: i64,
    pub order_number: String,
    pub sale_id: i64,
    pub status: OrderStatus,
    pub confirmed_at: Option<i64>,
}

pub async fn find_orphaned_sales(pool: &SqlitePool, scope: Scope) -> RepoResult<Vec<OrphanedSale>> {
    let rows = sqlx::query_as::<_, OrphanedSale>(
        "SELECT s.id AS sale_id, s.sale_number, s.source_order_id, o.status AS order_status, o.sale_id AS linked_sale_id, s.created_at FROM sale s LEFT JOIN online_order o ON o.id = s.source_order_id WHERE s.organization_id = ? AND s.branch_id = ? AND s.source_order_id IS NOT NULL AND (o.sale_id IS NULL OR o.sale_id != s.id) ORDER BY s.created_at",
    )
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_sales_without_ticket(
    pool: &SqlitePool,
    scope: Scope,
) -> RepoResult<Vec<SaleWithoutTicket>> {
    let rows = sqlx::query_as::<_, SaleWithoutTicket>(
        "SELECT s.id AS sale_id, s.sale_number, s.source_order_id, s.created_at FROM sale s WHERE s.organization_id = ? AND s.branch_id = ? AND NOT EXISTS (SELECT 1 FROM production_ticket t WHERE t.sale_id = s.id) ORDER BY s.created_at",
    )
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_orders_missing_gratuity(
    pool: &SqlitePool,
    scope: Scope,
) -> RepoResult<Vec<OrderGap>> {
    let rows = sqlx::query_as::<_, OrderGap>(
        "SELECT o.id AS order_id, o.order_number, o.sale_id, o.status, o.confirmed_at FROM online_order o WHERE o.organization_id = ? AND o.branch_id = ? AND o.sale_id IS NOT NULL AND o.tip_amount > 0 AND NOT EXISTS (SELECT 1 FROM gratuity g WHERE g.sale_id = o.sale_id AND g.tip_type = ?) ORDER BY o.confirmed_at",
    )
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(TipType::Online)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Only orders whose coupon exists and is currently active are expected to redeem
pub async fn find_orders_missing_redemption(
    pool: &SqlitePool,
    scope: Scope,
) -> RepoResult<Vec<OrderGap>> {
    let rows = sqlx::query_as::<_, OrderGap>(
        "SELECT o.id AS order_id, o.order_number, o.sale_id, o.status, o.confirmed_at FROM online_order o JOIN coupon c ON c.organization_id = o.organization_id AND upper(c.code) = upper(trim(o.coupon_code)) WHERE o.organization_id = ? AND o.branch_id = ? AND o.sale_id IS NOT NULL AND c.is_active = 1 AND NOT EXISTS (SELECT 1 FROM coupon_redemption r WHERE r.coupon_id = c.id AND r.sale_id = o.sale_id) ORDER BY o.confirmed_at",
    )
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_orders_missing_shipment(
    pool: &SqlitePool,
    scope: Scope,
) -> RepoResult<Vec<OrderGap>> {
    let rows = sqlx::query_as::<_, OrderGap>(
        "SELECT o.id AS order_id, o.order_number, o.sale_id, o.status, o.confirmed_at FROM online_order o WHERE o.organization_id = ? AND o.branch_id = ? AND o.sale_id IS NOT NULL AND o.delivery_type = ? AND o.status NOT IN (?, ?) AND NOT EXISTS (SELECT 1 FROM shipment s WHERE s.source_type = 'order' AND s.source_id = o.id) ORDER BY o.confirmed_at",
    )
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(DeliveryType::SelfDelivery)
    .bind(OrderStatus::Cancelled)
    .bind(OrderStatus::Rejected)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
