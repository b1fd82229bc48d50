//! Gratuity Repository
//!
//! 小费记录可能由前端预先创建 (sale_id = NULL, recorded_by = 0)，
//! 确认订单时按 source_order_id 或 notes 中的订单号找回并关联。

use super::{RepoError, RepoResult};
use shared::Scope;
use shared::models::{Gratuity, GratuityCreate, GratuityLink, TipType};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, organization_id, branch_id, sale_id, source_order_id, amount, tip_type, recorded_by, notes, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, scope: Scope, id: i64) -> RepoResult<Option<Gratuity>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM gratuity WHERE id = ? AND organization_id = ? AND branch_id = ?"
    );
    let gratuity = sqlx::query_as::<_, Gratuity>(&sql)
        .bind(id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_optional(pool)
        .await?;
    Ok(gratuity)
}

/// Explicit correlation
pub async fn find_by_source_order(
    pool: &SqlitePool,
    scope: Scope,
    order_id: i64,
) -> RepoResult<Option<Gratuity>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM gratuity WHERE source_order_id = ? AND organization_id = ? AND branch_id = ? ORDER BY created_at, id LIMIT 1"
    );
    let gratuity = sqlx::query_as::<_, Gratuity>(&sql)
        .bind(order_id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_optional(pool)
        .await?;
    Ok(gratuity)
}

/// Legacy correlation: order number embedded in notes
///
/// Online tips only, and only rows not yet correlated to another order.
/// `instr` narrows the scan; [`mentions_order_number`] rejects partial
/// matches (`WO-100` inside `WO-1001`). Oldest first.
pub async fn find_by_order_number(
    pool: &SqlitePool,
    scope: Scope,
    order_number: &str,
) -> RepoResult<Vec<Gratuity>> {
    let order_number = order_number.trim();
    if order_number.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {COLUMNS} FROM gratuity WHERE organization_id = ? AND branch_id = ? AND tip_type = ? AND source_order_id IS NULL AND notes IS NOT NULL AND instr(notes, ?) > 0 ORDER BY created_at, id"
    );
    let rows = sqlx::query_as::<_, Gratuity>(&sql)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .bind(TipType::Online)
        .bind(order_number)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .filter(|g| {
            g.notes
                .as_deref()
                .is_some_and(|notes| mentions_order_number(notes, order_number))
        })
        .collect())
}

/// `order_number` appears in `notes` as a whole token
///
/// Token characters: alphanumerics and `-`.
pub fn mentions_order_number(notes: &str, order_number: &str) -> bool {
    if order_number.is_empty() {
        return false;
    }
    let is_token = |c: char| c.is_alphanumeric() || c == '-';
    notes.match_indices(order_number).any(|(start, _)| {
        let before = notes[..start].chars().next_back();
        let after = notes[start + order_number.len()..].chars().next();
        !before.is_some_and(is_token) && !after.is_some_and(is_token)
    })
}

pub async fn create(pool: &SqlitePool, scope: Scope, data: &GratuityCreate) -> RepoResult<Gratuity> {
    if !data.amount.is_finite() || data.amount <= 0.0 {
        return Err(RepoError::Validation(format!(
            "Gratuity amount must be positive, got {}",
            data.amount
        )));
    }
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO gratuity (id, organization_id, branch_id, sale_id, source_order_id, amount, tip_type, recorded_by, notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
    )
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(data.sale_id)
    .bind(data.source_order_id)
    .bind(data.amount)
    .bind(data.tip_type)
    .bind(data.recorded_by)
    .bind(&data.notes)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create gratuity".into()))
}

/// Update in place: sale linkage, correlation column, actor
pub async fn link(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    data: &GratuityLink,
) -> RepoResult<Gratuity> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE gratuity SET sale_id = ?, source_order_id = ?, recorded_by = ?, updated_at = ? WHERE id = ? AND organization_id = ? AND branch_id = ?",
    )
    .bind(data.sale_id)
    .bind(data.source_order_id)
    .bind(data.recorded_by)
    .bind(now)
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Gratuity {id} not found")));
    }
    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Gratuity {id} not found")))
}

/// Placeholders never linked to a sale
pub async fn find_unlinked(pool: &SqlitePool, scope: Scope) -> RepoResult<Vec<Gratuity>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM gratuity WHERE organization_id = ? AND branch_id = ? AND sale_id IS NULL ORDER BY created_at"
    );
    let rows = sqlx::query_as::<_, Gratuity>(&sql)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_matches_whole_token() {
        assert!(mentions_order_number("Tip for WO-100", "WO-100"));
        assert!(mentions_order_number("WO-100", "WO-100"));
        assert!(mentions_order_number("tip (WO-100), thanks", "WO-100"));
        assert!(mentions_order_number("WO-1001 / WO-100", "WO-100"));
    }

    #[test]
    fn test_order_number_rejects_partial_match() {
        assert!(!mentions_order_number("Tip for WO-1001", "WO-100"));
        assert!(!mentions_order_number("Tip for XWO-100", "WO-100"));
        assert!(!mentions_order_number("Tip for WO-100-B", "WO-100"));
        assert!(!mentions_order_number("Tip for WO-100", ""));
    }
}
