//! Shipment Tracker
//!
//! Drives every shipment status change. Each operation is a sequence of
//! independent writes (shipment row, proof, source order, vehicle, event);
//! the first failing write stops the sequence and earlier writes stay.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use shared::Scope;
use shared::models::{
    DeliveryAddress, DeliveryAttempt, DeliveryStats, Driver, FailedAttemptInput, GeoPoint,
    OnlineOrder, OrderStatus, ProofInput, ProofOfDelivery, Shipment, ShipmentCreate,
    ShipmentStatus, TransportEvent, TransportEventCreate, TransportEventType, Vehicle,
    VehicleStatus,
};

use super::{SOURCE_ORDER, ShipmentError, tracking_number};
use crate::db::repository::RepoError;
use crate::orders::OrderStatusMachine;
use crate::stores::{Collaborators, FleetRegistry, ShipmentStore};

/// Tracking number collisions tolerated before giving up
const MAX_TRACKING_ATTEMPTS: u32 = 5;
/// Concurrent attempt-number collisions tolerated before giving up
const MAX_ATTEMPT_RETRIES: u32 = 3;

/// Result of a completed delivery
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub shipment: Shipment,
    pub proof: ProofOfDelivery,
}

/// What a dispatcher needs to assign work
#[derive(Debug, Clone, Serialize)]
pub struct DispatchBoard {
    pub vehicles: Vec<Vehicle>,
    pub drivers: Vec<Driver>,
    pub unassigned: Vec<Shipment>,
}

#[derive(Clone)]
pub struct ShipmentTracker {
    shipments: Arc<dyn ShipmentStore>,
    fleet: Arc<dyn FleetRegistry>,
    order_status: OrderStatusMachine,
    tracking_prefix: String,
}

impl ShipmentTracker {
    pub fn new(collaborators: &Collaborators, tracking_prefix: impl Into<String>) -> Self {
        Self {
            shipments: collaborators.shipments.clone(),
            fleet: collaborators.fleet.clone(),
            order_status: OrderStatusMachine::new(collaborators.orders.clone()),
            tracking_prefix: tracking_prefix.into(),
        }
    }

    // ========== Commands ==========

    /// Create the shipment for a self-delivery order
    ///
    /// Idempotent on `(source_type, source_id)`: an existing shipment is
    /// returned unchanged.
    pub async fn create_from_order(
        &self,
        scope: Scope,
        order: &OnlineOrder,
        address: DeliveryAddress,
        estimated_delivery_at: Option<i64>,
        actor_id: i64,
    ) -> Result<Shipment, ShipmentError> {
        if !order.is_self_delivery() {
            return Err(ShipmentError::NotSelfDelivery(order.id));
        }
        if let Some(existing) = self
            .shipments
            .find_by_source(scope, SOURCE_ORDER, order.id)
            .await?
        {
            tracing::debug!(
                target: "shipment",
                shipment_id = existing.id,
                order_id = order.id,
                "Shipment already exists for order"
            );
            return Ok(existing);
        }

        let mut data = ShipmentCreate {
            tracking_number: String::new(),
            source_type: SOURCE_ORDER.to_string(),
            source_id: order.id,
            recipient_name: order.customer_name.clone(),
            recipient_phone: order.customer_phone.clone(),
            address,
            estimated_delivery_at,
            created_by: actor_id,
        };

        for attempt in 1..=MAX_TRACKING_ATTEMPTS {
            data.tracking_number = tracking_number::generate(&self.tracking_prefix);
            match self.shipments.create(scope, &data).await {
                Ok(shipment) => {
                    self.emit(
                        &shipment,
                        TransportEventType::Created,
                        format!("Shipment created for order {}", order.order_number),
                        actor_id,
                        None,
                        json!({
                            "tracking_number": shipment.tracking_number,
                            "order_number": order.order_number,
                        }),
                    )
                    .await?;
                    tracing::info!(
                        target: "shipment",
                        shipment_id = shipment.id,
                        order_id = order.id,
                        tracking_number = %shipment.tracking_number,
                        "Shipment created"
                    );
                    return Ok(shipment);
                }
                Err(RepoError::Duplicate(msg)) => {
                    // Either another confirmation won the source slot, or the tracking number collided
                    if let Some(existing) = self
                        .shipments
                        .find_by_source(scope, SOURCE_ORDER, order.id)
                        .await?
                    {
                        return Ok(existing);
                    }
                    tracing::warn!(
                        target: "shipment",
                        order_id = order.id,
                        attempt,
                        error = %msg,
                        "Tracking number collision, regenerating"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ShipmentError::TrackingNumberExhausted(MAX_TRACKING_ATTEMPTS))
    }

    /// Assign vehicle + driver (re-assignment allowed while `assigned`)
    pub async fn assign(
        &self,
        scope: Scope,
        shipment_id: i64,
        vehicle_id: i64,
        driver_id: i64,
        estimated_delivery_at: Option<i64>,
        actor_id: i64,
    ) -> Result<Shipment, ShipmentError> {
        let shipment = self.get(scope, shipment_id).await?;
        ensure_transition(&shipment, ShipmentStatus::Assigned)?;

        let vehicle = self
            .fleet
            .find_vehicle(scope, vehicle_id)
            .await?
            .ok_or(ShipmentError::VehicleNotFound(vehicle_id))?;
        if matches!(
            vehicle.status,
            VehicleStatus::Maintenance | VehicleStatus::Inactive
        ) {
            return Err(ShipmentError::VehicleUnavailable {
                id: vehicle_id,
                status: vehicle.status,
            });
        }

        let now = shared::util::now_millis();
        let driver = self
            .fleet
            .find_driver(scope, driver_id)
            .await?
            .ok_or(ShipmentError::DriverNotFound(driver_id))?;
        if !driver.can_drive_at(now) {
            return Err(ShipmentError::DriverInactive(driver_id));
        }

        let metadata = with_assignment(&shipment.metadata, vehicle_id, driver_id, now);
        let previous_vehicle = shipment.vehicle_id.filter(|id| *id != vehicle_id);

        let updated = self
            .shipments
            .assign(
                scope,
                shipment_id,
                shipment.status,
                vehicle_id,
                driver_id,
                estimated_delivery_at,
                &metadata,
            )
            .await?;
        self.fleet.occupy_vehicle(scope, vehicle_id, driver_id).await?;
        if let Some(previous) = previous_vehicle {
            self.fleet.release_vehicle(scope, previous).await?;
        }

        self.emit(
            &updated,
            TransportEventType::Assigned,
            format!("Assigned to {} / {}", vehicle.plate, driver.name),
            actor_id,
            None,
            json!({
                "vehicle_id": vehicle_id,
                "driver_id": driver_id,
                "plate": vehicle.plate,
                "driver_name": driver.name,
                "estimated_delivery_at": updated.estimated_delivery_at,
                "previous_vehicle_id": previous_vehicle,
            }),
        )
        .await?;

        tracing::info!(
            target: "shipment",
            shipment_id,
            vehicle_id,
            driver_id,
            "Shipment assigned"
        );
        Ok(updated)
    }

    /// Driver collected the package; source order → `in_delivery`
    pub async fn mark_picked_up(
        &self,
        scope: Scope,
        shipment_id: i64,
        driver_id: i64,
        geo: Option<GeoPoint>,
    ) -> Result<Shipment, ShipmentError> {
        let shipment = self.get(scope, shipment_id).await?;
        ensure_transition(&shipment, ShipmentStatus::OutForDelivery)?;

        let at = shared::util::now_millis();
        let updated = self
            .shipments
            .mark_picked_up(scope, shipment_id, shipment.status, at)
            .await?;

        if updated.source_type == SOURCE_ORDER {
            self.order_status
                .transition(scope, updated.source_id, OrderStatus::InDelivery, at, None)
                .await?;
        }

        self.emit(
            &updated,
            TransportEventType::PickedUp,
            "Package picked up".to_string(),
            driver_id,
            geo,
            json!({ "driver_id": driver_id }),
        )
        .await?;

        tracing::info!(target: "shipment", shipment_id, driver_id, "Shipment picked up");
        Ok(updated)
    }

    /// Delivered with proof; source order → `delivered`, vehicle released
    pub async fn mark_delivered(
        &self,
        scope: Scope,
        shipment_id: i64,
        driver_id: i64,
        proof: ProofInput,
    ) -> Result<Delivery, ShipmentError> {
        if proof.recipient_name.trim().is_empty() {
            return Err(ShipmentError::InvalidRequest(
                "recipient_name must not be empty".into(),
            ));
        }

        let shipment = self.get(scope, shipment_id).await?;
        ensure_transition(&shipment, ShipmentStatus::Delivered)?;
        if self.shipments.proof(shipment_id).await?.is_some() {
            return Err(ShipmentError::ProofAlreadyCaptured(shipment_id));
        }

        let at = shared::util::now_millis();
        let updated = self
            .shipments
            .mark_delivered(scope, shipment_id, shipment.status, at)
            .await?;

        let proof = self
            .shipments
            .capture_proof(shipment_id, driver_id, at, &proof)
            .await
            .map_err(|e| match e {
                RepoError::Duplicate(_) => ShipmentError::ProofAlreadyCaptured(shipment_id),
                other => other.into(),
            })?;

        if updated.source_type == SOURCE_ORDER {
            self.order_status
                .transition(scope, updated.source_id, OrderStatus::Delivered, at, None)
                .await?;
        }

        if let Some(vehicle_id) = updated.vehicle_id {
            self.fleet.release_vehicle(scope, vehicle_id).await?;
        }

        self.emit(
            &updated,
            TransportEventType::Delivered,
            format!("Delivered to {}", proof.recipient_name),
            driver_id,
            proof.latitude.zip(proof.longitude).map(|(latitude, longitude)| GeoPoint {
                latitude,
                longitude,
            }),
            json!({ "proof_id": proof.id, "recipient_name": proof.recipient_name }),
        )
        .await?;

        tracing::info!(
            target: "shipment",
            shipment_id,
            driver_id,
            proof_id = proof.id,
            "Shipment delivered"
        );
        Ok(Delivery {
            shipment: updated,
            proof,
        })
    }

    /// Record a failed delivery attempt; status is unchanged
    pub async fn register_failed_attempt(
        &self,
        scope: Scope,
        shipment_id: i64,
        driver_id: i64,
        failure: FailedAttemptInput,
    ) -> Result<DeliveryAttempt, ShipmentError> {
        let shipment = self.get(scope, shipment_id).await?;
        if shipment.status.is_terminal() {
            return Err(ShipmentError::InvalidTransition {
                id: shipment_id,
                from: shipment.status,
                to: shipment.status,
            });
        }

        let mut retries = 0;
        let attempt = loop {
            match self
                .shipments
                .append_attempt(shipment_id, driver_id, &failure)
                .await
            {
                Ok(attempt) => break attempt,
                Err(RepoError::Duplicate(_)) if retries < MAX_ATTEMPT_RETRIES => {
                    retries += 1;
                    tracing::debug!(target: "shipment", shipment_id, retries, "Attempt number collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        self.emit(
            &shipment,
            TransportEventType::DeliveryFailed,
            format!("Delivery attempt {} failed", attempt.attempt_number),
            driver_id,
            failure.geo,
            json!({
                "attempt_id": attempt.id,
                "attempt_number": attempt.attempt_number,
                "reason": attempt.reason,
                "notes": attempt.notes,
            }),
        )
        .await?;

        tracing::warn!(
            target: "shipment",
            shipment_id,
            driver_id,
            attempt_number = attempt.attempt_number,
            reason = ?attempt.reason,
            "Delivery attempt failed"
        );
        Ok(attempt)
    }

    /// Package came back; terminal
    pub async fn mark_returned(
        &self,
        scope: Scope,
        shipment_id: i64,
        actor_id: i64,
        reason: Option<String>,
    ) -> Result<Shipment, ShipmentError> {
        self.close(
            scope,
            shipment_id,
            ShipmentStatus::Returned,
            TransportEventType::Returned,
            actor_id,
            reason,
        )
        .await
    }

    /// Shipment abandoned; terminal
    pub async fn cancel(
        &self,
        scope: Scope,
        shipment_id: i64,
        actor_id: i64,
        reason: Option<String>,
    ) -> Result<Shipment, ShipmentError> {
        self.close(
            scope,
            shipment_id,
            ShipmentStatus::Cancelled,
            TransportEventType::Cancelled,
            actor_id,
            reason,
        )
        .await
    }

    async fn close(
        &self,
        scope: Scope,
        shipment_id: i64,
        target: ShipmentStatus,
        event_type: TransportEventType,
        actor_id: i64,
        reason: Option<String>,
    ) -> Result<Shipment, ShipmentError> {
        let shipment = self.get(scope, shipment_id).await?;
        ensure_transition(&shipment, target)?;

        let updated = self
            .shipments
            .close(scope, shipment_id, shipment.status, target)
            .await?;
        if let Some(vehicle_id) = updated.vehicle_id {
            self.fleet.release_vehicle(scope, vehicle_id).await?;
        }

        let description = match &reason {
            Some(r) => format!("Shipment {target}: {r}"),
            None => format!("Shipment {target}"),
        };
        self.emit(
            &updated,
            event_type,
            description,
            actor_id,
            None,
            json!({ "from": shipment.status, "reason": reason }),
        )
        .await?;

        tracing::info!(target: "shipment", shipment_id, status = %target, "Shipment closed");
        Ok(updated)
    }

    // ========== Queries ==========

    pub async fn get(&self, scope: Scope, shipment_id: i64) -> Result<Shipment, ShipmentError> {
        self.shipments
            .find_by_id(scope, shipment_id)
            .await?
            .ok_or(ShipmentError::NotFound(shipment_id))
    }

    pub async fn find_for_order(
        &self,
        scope: Scope,
        order_id: i64,
    ) -> Result<Option<Shipment>, ShipmentError> {
        Ok(self
            .shipments
            .find_by_source(scope, SOURCE_ORDER, order_id)
            .await?)
    }

    pub async fn events(
        &self,
        scope: Scope,
        shipment_id: i64,
    ) -> Result<Vec<TransportEvent>, ShipmentError> {
        self.get(scope, shipment_id).await?;
        Ok(self.shipments.events(shipment_id).await?)
    }

    pub async fn attempts(
        &self,
        scope: Scope,
        shipment_id: i64,
    ) -> Result<Vec<DeliveryAttempt>, ShipmentError> {
        self.get(scope, shipment_id).await?;
        Ok(self.shipments.attempts(shipment_id).await?)
    }

    pub async fn proof(
        &self,
        scope: Scope,
        shipment_id: i64,
    ) -> Result<Option<ProofOfDelivery>, ShipmentError> {
        self.get(scope, shipment_id).await?;
        Ok(self.shipments.proof(shipment_id).await?)
    }

    /// KPIs for shipments created in `[from, to)`
    pub async fn delivery_stats(
        &self,
        scope: Scope,
        from: i64,
        to: i64,
    ) -> Result<DeliveryStats, ShipmentError> {
        if from >= to {
            return Err(ShipmentError::InvalidRequest(format!(
                "`from` ({from}) must be before `to` ({to})"
            )));
        }
        Ok(self.shipments.stats(scope, from, to).await?)
    }

    /// Available vehicles and drivers, plus shipments waiting for assignment
    pub async fn dispatch_board(&self, scope: Scope) -> Result<DispatchBoard, ShipmentError> {
        let now = shared::util::now_millis();
        let (vehicles, drivers, unassigned) = tokio::try_join!(
            self.fleet.available_vehicles(scope),
            self.fleet.available_drivers(scope, now),
            self.shipments.find_unassigned(scope),
        )?;
        Ok(DispatchBoard {
            vehicles,
            drivers,
            unassigned,
        })
    }

    async fn emit(
        &self,
        shipment: &Shipment,
        event_type: TransportEventType,
        description: String,
        actor_id: i64,
        geo: Option<GeoPoint>,
        payload: Value,
    ) -> Result<TransportEvent, ShipmentError> {
        let event = self
            .shipments
            .append_event(&TransportEventCreate {
                shipment_id: shipment.id,
                event_type,
                description,
                actor_id,
                geo,
                payload,
            })
            .await?;
        Ok(event)
    }
}

fn ensure_transition(shipment: &Shipment, to: ShipmentStatus) -> Result<(), ShipmentError> {
    if shipment.status.can_advance_to(to) {
        Ok(())
    } else {
        Err(ShipmentError::InvalidTransition {
            id: shipment.id,
            from: shipment.status,
            to,
        })
    }
}

/// Merge the assignment into existing metadata, keeping other keys
fn with_assignment(metadata: &Value, vehicle_id: i64, driver_id: i64, assigned_at: i64) -> Value {
    let mut merged = match metadata {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    merged.insert(
        "assignment".to_string(),
        json!({
            "vehicle_id": vehicle_id,
            "driver_id": driver_id,
            "assigned_at": assigned_at,
        }),
    );
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_assignment_keeps_other_keys() {
        let existing = json!({ "channel": "web", "assignment": { "vehicle_id": 1 } });
        let merged = with_assignment(&existing, 2, 3, 100);
        assert_eq!(merged["channel"], "web");
        assert_eq!(merged["assignment"]["vehicle_id"], 2);
        assert_eq!(merged["assignment"]["driver_id"], 3);
        assert_eq!(merged["assignment"]["assigned_at"], 100);
    }

    #[test]
    fn test_with_assignment_on_non_object() {
        let merged = with_assignment(&Value::Null, 5, 6, 7);
        assert_eq!(merged["assignment"]["vehicle_id"], 5);
    }
}
