//! Production Ticket Repository

use super::{RepoError, RepoResult};
use shared::Scope;
use shared::models::{
    PrepStatus, ProductionTicket, ProductionTicketCreate, TicketItem, TicketItemCreate,
    TicketStatus,
};
use sqlx::SqlitePool;

const TICKET_COLUMNS: &str =
    "id, organization_id, branch_id, sale_id, ticket_number, source, status, notes, created_at";

pub async fn find_by_id(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
) -> RepoResult<Option<ProductionTicket>> {
    let sql = format!(
        "SELECT {TICKET_COLUMNS} FROM production_ticket WHERE id = ? AND organization_id = ? AND branch_id = ?"
    );
    let ticket = sqlx::query_as::<_, ProductionTicket>(&sql)
        .bind(id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_optional(pool)
        .await?;
    Ok(ticket)
}

pub async fn find_by_sale(
    pool: &SqlitePool,
    scope: Scope,
    sale_id: i64,
) -> RepoResult<Vec<ProductionTicket>> {
    let sql = format!(
        "SELECT {TICKET_COLUMNS} FROM production_ticket WHERE sale_id = ? AND organization_id = ? AND branch_id = ? ORDER BY created_at"
    );
    let tickets = sqlx::query_as::<_, ProductionTicket>(&sql)
        .bind(sale_id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_all(pool)
        .await?;
    Ok(tickets)
}

/// Ticket and its items are written in one transaction
pub async fn create_ticket(
    pool: &SqlitePool,
    scope: Scope,
    data: &ProductionTicketCreate,
    items: &[TicketItemCreate],
) -> RepoResult<ProductionTicket> {
    if items.is_empty() {
        return Err(RepoError::Validation(format!(
            "Sale {} has no items to produce",
            data.sale_id
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO production_ticket (id, organization_id, branch_id, sale_id, ticket_number, source, status, notes, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(data.sale_id)
    .bind(&data.ticket_number)
    .bind(&data.source)
    .bind(TicketStatus::Pending)
    .bind(&data.notes)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO ticket_item (id, ticket_id, sale_item_id, product_id, product_name, quantity, notes, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(shared::util::snowflake_id())
        .bind(id)
        .bind(item.sale_item_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(&item.notes)
        .bind(PrepStatus::Pending)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create production ticket".into()))
}

pub async fn find_items(pool: &SqlitePool, ticket_id: i64) -> RepoResult<Vec<TicketItem>> {
    let items = sqlx::query_as::<_, TicketItem>(
        "SELECT id, ticket_id, sale_item_id, product_id, product_name, quantity, notes, status, created_at FROM ticket_item WHERE ticket_id = ? ORDER BY created_at, id",
    )
    .bind(ticket_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}
