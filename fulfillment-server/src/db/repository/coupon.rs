//! Coupon Repository

use super::{RepoError, RepoResult};
use shared::models::{Coupon, CouponRedemption, DiscountType, RedemptionCreate};
use sqlx::SqlitePool;

const COUPON_COLUMNS: &str = "id, organization_id, code, description, discount_type, discount_value, is_active, usage_count, max_uses, valid_from, valid_until, created_at";

const REDEMPTION_COLUMNS: &str =
    "id, organization_id, coupon_id, sale_id, customer_id, discount_amount, redeemed_at";

pub async fn find_by_id(
    pool: &SqlitePool,
    organization_id: i64,
    id: i64,
) -> RepoResult<Option<Coupon>> {
    let sql = format!("SELECT {COUPON_COLUMNS} FROM coupon WHERE id = ? AND organization_id = ?");
    let coupon = sqlx::query_as::<_, Coupon>(&sql)
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await?;
    Ok(coupon)
}

/// Codes are matched case-insensitively
pub async fn find_by_code(
    pool: &SqlitePool,
    organization_id: i64,
    code: &str,
) -> RepoResult<Option<Coupon>> {
    let sql = format!(
        "SELECT {COUPON_COLUMNS} FROM coupon WHERE organization_id = ? AND upper(code) = upper(?) LIMIT 1"
    );
    let coupon = sqlx::query_as::<_, Coupon>(&sql)
        .bind(organization_id)
        .bind(code.trim())
        .fetch_optional(pool)
        .await?;
    Ok(coupon)
}

pub async fn create(
    pool: &SqlitePool,
    organization_id: i64,
    code: &str,
    discount_type: DiscountType,
    discount_value: f64,
    max_uses: Option<i64>,
) -> RepoResult<Coupon> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO coupon (id, organization_id, code, discount_type, discount_value, is_active, usage_count, max_uses, created_at) VALUES (?, ?, ?, ?, ?, 1, 0, ?, ?)",
    )
    .bind(id)
    .bind(organization_id)
    .bind(code)
    .bind(discount_type)
    .bind(discount_value)
    .bind(max_uses)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, organization_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create coupon".into()))
}

pub async fn set_active(
    pool: &SqlitePool,
    organization_id: i64,
    id: i64,
    is_active: bool,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE coupon SET is_active = ? WHERE id = ? AND organization_id = ?")
        .bind(is_active)
        .bind(id)
        .bind(organization_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Coupon {id} not found")));
    }
    Ok(())
}

pub async fn find_redemption_by_id(
    pool: &SqlitePool,
    organization_id: i64,
    id: i64,
) -> RepoResult<Option<CouponRedemption>> {
    let sql = format!(
        "SELECT {REDEMPTION_COLUMNS} FROM coupon_redemption WHERE id = ? AND organization_id = ?"
    );
    let redemption = sqlx::query_as::<_, CouponRedemption>(&sql)
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await?;
    Ok(redemption)
}

/// Exact match on the sale reference (placeholder or real)
pub async fn find_redemption(
    pool: &SqlitePool,
    organization_id: i64,
    coupon_id: i64,
    sale_id: i64,
) -> RepoResult<Option<CouponRedemption>> {
    let sql = format!(
        "SELECT {REDEMPTION_COLUMNS} FROM coupon_redemption WHERE organization_id = ? AND coupon_id = ? AND sale_id = ? ORDER BY redeemed_at, id LIMIT 1"
    );
    let redemption = sqlx::query_as::<_, CouponRedemption>(&sql)
        .bind(organization_id)
        .bind(coupon_id)
        .bind(sale_id)
        .fetch_optional(pool)
        .await?;
    Ok(redemption)
}

/// Overwrite the placeholder sale reference with the real sale
pub async fn relink_redemption(
    pool: &SqlitePool,
    organization_id: i64,
    id: i64,
    sale_id: i64,
) -> RepoResult<CouponRedemption> {
    let rows = sqlx::query(
        "UPDATE coupon_redemption SET sale_id = ? WHERE id = ? AND organization_id = ?",
    )
    .bind(sale_id)
    .bind(id)
    .bind(organization_id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Coupon redemption {id} not found")));
    }
    find_redemption_by_id(pool, organization_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Coupon redemption {id} not found")))
}

/// Create a redemption and bump the coupon's usage counter atomically
pub async fn redeem(
    pool: &SqlitePool,
    organization_id: i64,
    data: &RedemptionCreate,
) -> RepoResult<CouponRedemption> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO coupon_redemption (id, organization_id, coupon_id, sale_id, customer_id, discount_amount, redeemed_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(organization_id)
    .bind(data.coupon_id)
    .bind(data.sale_id)
    .bind(data.customer_id)
    .bind(data.discount_amount)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let rows = sqlx::query(
        "UPDATE coupon SET usage_count = usage_count + 1 WHERE id = ? AND organization_id = ?",
    )
    .bind(data.coupon_id)
    .bind(organization_id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Coupon {} not found", data.coupon_id)));
    }
    tx.commit().await?;

    find_redemption_by_id(pool, organization_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create coupon redemption".into()))
}

pub async fn count_redemptions(pool: &SqlitePool, coupon_id: i64) -> RepoResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM coupon_redemption WHERE coupon_id = ?")
            .bind(coupon_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
