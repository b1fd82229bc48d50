//! Sale Repository

use super::{RepoError, RepoResult};
use shared::Scope;
use shared::models::{Sale, SaleCreate, SaleItem, SaleItemCreate, SaleItemRef, SaleStatus};
use sqlx::SqlitePool;
use sqlx::types::Json;

const SALE_COLUMNS: &str = "id, organization_id, branch_id, sale_number, source_order_id, channel, customer_id, customer_name, subtotal, tax_amount, discount_amount, delivery_fee, tip_amount, total, payment_status, payment_method, status, created_by, created_at";

pub async fn find_by_id(pool: &SqlitePool, scope: Scope, id: i64) -> RepoResult<Option<Sale>> {
    let sql = format!(
        "SELECT {SALE_COLUMNS} FROM sale WHERE id = ? AND organization_id = ? AND branch_id = ?"
    );
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_optional(pool)
        .await?;
    Ok(sale)
}

pub async fn find_by_source_order(
    pool: &SqlitePool,
    scope: Scope,
    order_id: i64,
) -> RepoResult<Vec<Sale>> {
    let sql = format!(
        "SELECT {SALE_COLUMNS} FROM sale WHERE source_order_id = ? AND organization_id = ? AND branch_id = ? ORDER BY created_at"
    );
    let sales = sqlx::query_as::<_, Sale>(&sql)
        .bind(order_id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_all(pool)
        .await?;
    Ok(sales)
}

pub async fn create(pool: &SqlitePool, scope: Scope, data: &SaleCreate) -> RepoResult<Sale> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO sale (id, organization_id, branch_id, sale_number, source_order_id, channel, customer_id, customer_name, subtotal, tax_amount, discount_amount, delivery_fee, tip_amount, total, payment_status, payment_method, status, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(&data.sale_number)
    .bind(data.source_order_id)
    .bind(&data.channel)
    .bind(data.customer_id)
    .bind(&data.customer_name)
    .bind(data.subtotal)
    .bind(data.tax_amount)
    .bind(data.discount_amount)
    .bind(data.delivery_fee)
    .bind(data.tip_amount)
    .bind(data.total)
    .bind(data.payment_status)
    .bind(&data.payment_method)
    .bind(SaleStatus::Completed)
    .bind(data.created_by)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create sale".into()))
}

/// Insert all items of a sale in one transaction, returning their identities in input order
pub async fn create_items(
    pool: &SqlitePool,
    sale_id: i64,
    items: &[SaleItemCreate],
) -> RepoResult<Vec<SaleItemRef>> {
    let now = shared::util::now_millis();
    let mut refs = Vec::with_capacity(items.len());

    let mut tx = pool.begin().await?;
    for item in items {
        let id = shared::util::snowflake_id();
        sqlx::query(
            "INSERT INTO sale_item (id, sale_id, product_id, quantity, unit_price, tax_amount, discount_amount, line_total, annotation, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(sale_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.tax_amount)
        .bind(item.discount_amount)
        .bind(item.line_total)
        .bind(Json(&item.annotation))
        .bind(now)
        .execute(&mut *tx)
        .await?;
        refs.push(SaleItemRef {
            id,
            product_id: item.product_id,
        });
    }
    tx.commit().await?;
    Ok(refs)
}

pub async fn find_items(pool: &SqlitePool, sale_id: i64) -> RepoResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        "SELECT id, sale_id, product_id, quantity, unit_price, tax_amount, discount_amount, line_total, annotation, created_at FROM sale_item WHERE sale_id = ? ORDER BY created_at, id",
    )
    .bind(sale_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}
