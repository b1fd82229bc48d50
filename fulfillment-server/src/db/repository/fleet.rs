//! Fleet Repository (vehicles & drivers)

use super::{RepoError, RepoResult};
use shared::Scope;
use shared::models::{Driver, DriverCreate, Vehicle, VehicleCreate, VehicleStatus};
use sqlx::SqlitePool;

const VEHICLE_COLUMNS: &str =
    "id, organization_id, branch_id, plate, kind, status, current_driver_id, updated_at";

const DRIVER_COLUMNS: &str = "id, organization_id, branch_id, name, phone, license_number, license_expires_at, is_active, created_at";

pub async fn find_vehicle(pool: &SqlitePool, scope: Scope, id: i64) -> RepoResult<Option<Vehicle>> {
    let sql = format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicle WHERE id = ? AND organization_id = ? AND branch_id = ?"
    );
    let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
        .bind(id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_optional(pool)
        .await?;
    Ok(vehicle)
}

pub async fn find_driver(pool: &SqlitePool, scope: Scope, id: i64) -> RepoResult<Option<Driver>> {
    let sql = format!(
        "SELECT {DRIVER_COLUMNS} FROM driver WHERE id = ? AND organization_id = ? AND branch_id = ?"
    );
    let driver = sqlx::query_as::<_, Driver>(&sql)
        .bind(id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_optional(pool)
        .await?;
    Ok(driver)
}

pub async fn create_vehicle(pool: &SqlitePool, scope: Scope, data: &VehicleCreate) -> RepoResult<Vehicle> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO vehicle (id, organization_id, branch_id, plate, kind, status, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(data.plate.trim())
    .bind(data.kind)
    .bind(VehicleStatus::Available)
    .bind(now)
    .execute(pool)
    .await?;

    find_vehicle(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create vehicle".into()))
}

pub async fn create_driver(pool: &SqlitePool, scope: Scope, data: &DriverCreate) -> RepoResult<Driver> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO driver (id, organization_id, branch_id, name, phone, license_number, license_expires_at, is_active, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(data.name.trim())
    .bind(&data.phone)
    .bind(&data.license_number)
    .bind(data.license_expires_at)
    .bind(now)
    .execute(pool)
    .await?;

    find_driver(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create driver".into()))
}

/// Mark a vehicle `in_use` with the driver attached
pub async fn occupy_vehicle(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    driver_id: i64,
) -> RepoResult<Vehicle> {
    set_vehicle_state(pool, scope, id, VehicleStatus::InUse, Some(driver_id)).await
}

/// Back to `available`, driver detached
pub async fn release_vehicle(pool: &SqlitePool, scope: Scope, id: i64) -> RepoResult<Vehicle> {
    set_vehicle_state(pool, scope, id, VehicleStatus::Available, None).await
}

pub async fn set_vehicle_status(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    status: VehicleStatus,
) -> RepoResult<Vehicle> {
    set_vehicle_state(pool, scope, id, status, None).await
}

async fn set_vehicle_state(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    status: VehicleStatus,
    driver_id: Option<i64>,
) -> RepoResult<Vehicle> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE vehicle SET status = ?, current_driver_id = ?, updated_at = ? WHERE id = ? AND organization_id = ? AND branch_id = ?",
    )
    .bind(status)
    .bind(driver_id)
    .bind(now)
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Vehicle {id} not found")));
    }
    find_vehicle(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Vehicle {id} not found")))
}

pub async fn find_available_vehicles(pool: &SqlitePool, scope: Scope) -> RepoResult<Vec<Vehicle>> {
    let sql = format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicle WHERE organization_id = ? AND branch_id = ? AND status = ? ORDER BY plate"
    );
    let vehicles = sqlx::query_as::<_, Vehicle>(&sql)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .bind(VehicleStatus::Available)
        .fetch_all(pool)
        .await?;
    Ok(vehicles)
}

/// Active drivers with a valid license who are not attached to a vehicle in use
pub async fn find_available_drivers(
    pool: &SqlitePool,
    scope: Scope,
    now: i64,
) -> RepoResult<Vec<Driver>> {
    let sql = format!(
        "SELECT {DRIVER_COLUMNS} FROM driver d WHERE d.organization_id = ? AND d.branch_id = ? AND d.is_active = 1 AND (d.license_expires_at IS NULL OR d.license_expires_at > ?) AND NOT EXISTS (SELECT 1 FROM vehicle v WHERE v.current_driver_id = d.id AND v.status = ?) ORDER BY d.name"
    );
    let drivers = sqlx::query_as::<_, Driver>(&sql)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .bind(now)
        .bind(VehicleStatus::InUse)
        .fetch_all(pool)
        .await?;
    Ok(drivers)
}
