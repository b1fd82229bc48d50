//! Shipment Repository
//!
//! Shipments, transport events, delivery attempts and proofs of delivery.
//! Status writes are compare-and-set on the previous status.

use super::{RepoError, RepoResult};
use serde_json::Value;
use shared::Scope;
use shared::models::{
    DeliveryAttempt, DeliveryStats, FailedAttemptInput, ProofInput, ProofOfDelivery, Shipment,
    ShipmentCreate, ShipmentStatus, TransportEvent, TransportEventCreate,
};
use sqlx::SqlitePool;
use sqlx::types::Json;

const SHIPMENT_COLUMNS: &str = "id, organization_id, branch_id, tracking_number, source_type, source_id, recipient_name, recipient_phone, address_line, city, region, neighborhood, postal_code, latitude, longitude, instructions, vehicle_id, driver_id, status, estimated_delivery_at, picked_up_at, dispatched_at, delivered_at, metadata, created_by, created_at, updated_at";

const EVENT_COLUMNS: &str =
    "id, shipment_id, event_type, description, actor_id, latitude, longitude, payload, occurred_at";

const ATTEMPT_COLUMNS: &str = "id, shipment_id, attempt_number, driver_id, reason, notes, latitude, longitude, photo_ref, attempted_at";

const PROOF_COLUMNS: &str = "id, shipment_id, recipient_name, recipient_document, signature_ref, photo_ref, notes, latitude, longitude, captured_by, delivered_at";

// ── Shipments ───────────────────────────────────────────────────

pub async fn find_by_id(pool: &SqlitePool, scope: Scope, id: i64) -> RepoResult<Option<Shipment>> {
    let sql = format!(
        "SELECT {SHIPMENT_COLUMNS} FROM shipment WHERE id = ? AND organization_id = ? AND branch_id = ?"
    );
    let shipment = sqlx::query_as::<_, Shipment>(&sql)
        .bind(id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_optional(pool)
        .await?;
    Ok(shipment)
}

pub async fn find_by_source(
    pool: &SqlitePool,
    scope: Scope,
    source_type: &str,
    source_id: i64,
) -> RepoResult<Option<Shipment>> {
    let sql = format!(
        "SELECT {SHIPMENT_COLUMNS} FROM shipment WHERE source_type = ? AND source_id = ? AND organization_id = ? AND branch_id = ?"
    );
    let shipment = sqlx::query_as::<_, Shipment>(&sql)
        .bind(source_type)
        .bind(source_id)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .fetch_optional(pool)
        .await?;
    Ok(shipment)
}

/// Insert a new shipment
///
/// Returns [`RepoError::Duplicate`] on a tracking-number or source collision;
/// the caller decides which one it was.
pub async fn create(pool: &SqlitePool, scope: Scope, data: &ShipmentCreate) -> RepoResult<Shipment> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let addr = &data.address;
    sqlx::query(
        "INSERT INTO shipment (id, organization_id, branch_id, tracking_number, source_type, source_id, recipient_name, recipient_phone, address_line, city, region, neighborhood, postal_code, latitude, longitude, instructions, status, estimated_delivery_at, metadata, created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, '{}', ?19, ?20, ?20)",
    )
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(&data.tracking_number)
    .bind(&data.source_type)
    .bind(data.source_id)
    .bind(&data.recipient_name)
    .bind(&data.recipient_phone)
    .bind(&addr.address_line)
    .bind(&addr.city)
    .bind(&addr.region)
    .bind(&addr.neighborhood)
    .bind(&addr.postal_code)
    .bind(addr.latitude)
    .bind(addr.longitude)
    .bind(&addr.instructions)
    .bind(ShipmentStatus::Pending)
    .bind(data.estimated_delivery_at)
    .bind(data.created_by)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create shipment".into()))
}

fn check_cas(rows: u64, id: i64, expected: ShipmentStatus) -> RepoResult<()> {
    if rows == 0 {
        return Err(RepoError::Validation(format!(
            "Shipment {id} is no longer {expected}"
        )));
    }
    Ok(())
}

/// `expected → assigned`, recording vehicle, driver and assignment metadata
#[allow(clippy::too_many_arguments)]
pub async fn assign(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    expected: ShipmentStatus,
    vehicle_id: i64,
    driver_id: i64,
    estimated_delivery_at: Option<i64>,
    metadata: &Value,
) -> RepoResult<Shipment> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE shipment SET status = ?, vehicle_id = ?, driver_id = ?, estimated_delivery_at = COALESCE(?, estimated_delivery_at), metadata = ?, updated_at = ? WHERE id = ? AND organization_id = ? AND branch_id = ? AND status = ?",
    )
    .bind(ShipmentStatus::Assigned)
    .bind(vehicle_id)
    .bind(driver_id)
    .bind(estimated_delivery_at)
    .bind(Json(metadata))
    .bind(now)
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(expected)
    .execute(pool)
    .await?;
    check_cas(rows.rows_affected(), id, expected)?;

    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Shipment {id} not found")))
}

/// `expected → out_for_delivery`, stamping pickup and dispatch time
pub async fn mark_picked_up(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    expected: ShipmentStatus,
    at: i64,
) -> RepoResult<Shipment> {
    let rows = sqlx::query(
        "UPDATE shipment SET status = ?1, picked_up_at = ?2, dispatched_at = ?2, updated_at = ?2 WHERE id = ?3 AND organization_id = ?4 AND branch_id = ?5 AND status = ?6",
    )
    .bind(ShipmentStatus::OutForDelivery)
    .bind(at)
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(expected)
    .execute(pool)
    .await?;
    check_cas(rows.rows_affected(), id, expected)?;

    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Shipment {id} not found")))
}

/// `expected → delivered`
pub async fn mark_delivered(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    expected: ShipmentStatus,
    at: i64,
) -> RepoResult<Shipment> {
    let rows = sqlx::query(
        "UPDATE shipment SET status = ?1, delivered_at = ?2, updated_at = ?2 WHERE id = ?3 AND organization_id = ?4 AND branch_id = ?5 AND status = ?6",
    )
    .bind(ShipmentStatus::Delivered)
    .bind(at)
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(expected)
    .execute(pool)
    .await?;
    check_cas(rows.rows_affected(), id, expected)?;

    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Shipment {id} not found")))
}

/// `expected → returned | cancelled`
pub async fn close(
    pool: &SqlitePool,
    scope: Scope,
    id: i64,
    expected: ShipmentStatus,
    status: ShipmentStatus,
) -> RepoResult<Shipment> {
    if !matches!(status, ShipmentStatus::Returned | ShipmentStatus::Cancelled) {
        return Err(RepoError::Validation(format!(
            "{status} is not a closing status"
        )));
    }
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE shipment SET status = ?, updated_at = ? WHERE id = ? AND organization_id = ? AND branch_id = ? AND status = ?",
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(expected)
    .execute(pool)
    .await?;
    check_cas(rows.rows_affected(), id, expected)?;

    find_by_id(pool, scope, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Shipment {id} not found")))
}

/// Shipments waiting for a vehicle
pub async fn find_unassigned(pool: &SqlitePool, scope: Scope) -> RepoResult<Vec<Shipment>> {
    let sql = format!(
        "SELECT {SHIPMENT_COLUMNS} FROM shipment WHERE organization_id = ? AND branch_id = ? AND status = ? ORDER BY created_at"
    );
    let shipments = sqlx::query_as::<_, Shipment>(&sql)
        .bind(scope.organization_id)
        .bind(scope.branch_id)
        .bind(ShipmentStatus::Pending)
        .fetch_all(pool)
        .await?;
    Ok(shipments)
}

// ── Transport events ────────────────────────────────────────────

pub async fn insert_event(pool: &SqlitePool, data: &TransportEventCreate) -> RepoResult<TransportEvent> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO transport_event (shipment_id, event_type, description, actor_id, latitude, longitude, payload, occurred_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(data.shipment_id)
    .bind(data.event_type)
    .bind(&data.description)
    .bind(data.actor_id)
    .bind(data.geo.map(|g| g.latitude))
    .bind(data.geo.map(|g| g.longitude))
    .bind(Json(&data.payload))
    .bind(now)
    .fetch_one(pool)
    .await?;

    let sql = format!("SELECT {EVENT_COLUMNS} FROM transport_event WHERE id = ?");
    let event = sqlx::query_as::<_, TransportEvent>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(event)
}

/// Chronological: event time, then insertion sequence
pub async fn find_events(pool: &SqlitePool, shipment_id: i64) -> RepoResult<Vec<TransportEvent>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM transport_event WHERE shipment_id = ? ORDER BY occurred_at, id"
    );
    let events = sqlx::query_as::<_, TransportEvent>(&sql)
        .bind(shipment_id)
        .fetch_all(pool)
        .await?;
    Ok(events)
}

// ── Delivery attempts ───────────────────────────────────────────

/// Append an attempt numbered `MAX(attempt_number) + 1` in a single statement
///
/// The `(shipment_id, attempt_number)` unique index turns a concurrent
/// collision into [`RepoError::Duplicate`] instead of a repeated number.
pub async fn insert_attempt(
    pool: &SqlitePool,
    shipment_id: i64,
    driver_id: i64,
    data: &FailedAttemptInput,
) -> RepoResult<DeliveryAttempt> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO delivery_attempt (id, shipment_id, attempt_number, driver_id, reason, notes, latitude, longitude, photo_ref, attempted_at) SELECT ?1, ?2, COALESCE(MAX(attempt_number), 0) + 1, ?3, ?4, ?5, ?6, ?7, ?8, ?9 FROM delivery_attempt WHERE shipment_id = ?2",
    )
    .bind(id)
    .bind(shipment_id)
    .bind(driver_id)
    .bind(data.reason)
    .bind(&data.notes)
    .bind(data.geo.map(|g| g.latitude))
    .bind(data.geo.map(|g| g.longitude))
    .bind(&data.photo_ref)
    .bind(now)
    .execute(pool)
    .await?;

    let sql = format!("SELECT {ATTEMPT_COLUMNS} FROM delivery_attempt WHERE id = ?");
    let attempt = sqlx::query_as::<_, DeliveryAttempt>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(attempt)
}

pub async fn find_attempts(pool: &SqlitePool, shipment_id: i64) -> RepoResult<Vec<DeliveryAttempt>> {
    let sql = format!(
        "SELECT {ATTEMPT_COLUMNS} FROM delivery_attempt WHERE shipment_id = ? ORDER BY attempt_number"
    );
    let attempts = sqlx::query_as::<_, DeliveryAttempt>(&sql)
        .bind(shipment_id)
        .fetch_all(pool)
        .await?;
    Ok(attempts)
}

// ── Proof of delivery ───────────────────────────────────────────

/// At most one per shipment (unique index → [`RepoError::Duplicate`])
pub async fn insert_proof(
    pool: &SqlitePool,
    shipment_id: i64,
    captured_by: i64,
    delivered_at: i64,
    data: &ProofInput,
) -> RepoResult<ProofOfDelivery> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO proof_of_delivery (id, shipment_id, recipient_name, recipient_document, signature_ref, photo_ref, notes, latitude, longitude, captured_by, delivered_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(shipment_id)
    .bind(data.recipient_name.trim())
    .bind(&data.recipient_document)
    .bind(&data.signature_ref)
    .bind(&data.photo_ref)
    .bind(&data.notes)
    .bind(data.geo.map(|g| g.latitude))
    .bind(data.geo.map(|g| g.longitude))
    .bind(captured_by)
    .bind(delivered_at)
    .execute(pool)
    .await?;

    find_proof(pool, shipment_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create proof of delivery".into()))
}

pub async fn find_proof(pool: &SqlitePool, shipment_id: i64) -> RepoResult<Option<ProofOfDelivery>> {
    let sql = format!("SELECT {PROOF_COLUMNS} FROM proof_of_delivery WHERE shipment_id = ?");
    let proof = sqlx::query_as::<_, ProofOfDelivery>(&sql)
        .bind(shipment_id)
        .fetch_optional(pool)
        .await?;
    Ok(proof)
}

// ── Statistics ──────────────────────────────────────────────────

/// Delivery KPIs for shipments created in `[from, to)`
pub async fn stats(pool: &SqlitePool, scope: Scope, from: i64, to: i64) -> RepoResult<DeliveryStats> {
    let counts: Vec<(ShipmentStatus, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM shipment WHERE organization_id = ? AND branch_id = ? AND created_at >= ? AND created_at < ? GROUP BY status",
    )
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let failed_attempts: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM delivery_attempt a JOIN shipment s ON s.id = a.shipment_id WHERE s.organization_id = ? AND s.branch_id = ? AND s.created_at >= ? AND s.created_at < ?",
    )
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    let avg_delivery_minutes: Option<f64> = sqlx::query_scalar(
        "SELECT AVG((delivered_at - picked_up_at) / 60000.0) FROM shipment WHERE organization_id = ? AND branch_id = ? AND created_at >= ? AND created_at < ? AND status = ? AND delivered_at IS NOT NULL AND picked_up_at IS NOT NULL",
    )
    .bind(scope.organization_id)
    .bind(scope.branch_id)
    .bind(from)
    .bind(to)
    .bind(ShipmentStatus::Delivered)
    .fetch_one(pool)
    .await?;

    let mut stats = DeliveryStats {
        failed_attempts,
        avg_delivery_minutes,
        ..Default::default()
    };
    for (status, count) in counts {
        stats.total += count;
        match status {
            ShipmentStatus::Pending => stats.pending = count,
            ShipmentStatus::Assigned => stats.assigned = count,
            ShipmentStatus::OutForDelivery => stats.out_for_delivery = count,
            ShipmentStatus::Delivered => stats.delivered = count,
            ShipmentStatus::Returned => stats.returned = count,
            ShipmentStatus::Cancelled => stats.cancelled = count,
        }
    }
    Ok(stats)
}
