//! Shipment Models (self-delivery tracking)
//!
//! 一个 shipment 对应一个 self-delivery 订单，附带事件流、失败投递记录和签收凭证。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shipment status
///
/// ```text
/// pending → assigned → out_for_delivery → delivered
///    └─────────┴──────────────┴──→ returned | cancelled
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ShipmentStatus {
    #[default]
    Pending,
    Assigned,
    OutForDelivery,
    Delivered,
    Returned,
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
        }
    }

    /// Position along the forward path; diversions share the terminal rank
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Assigned => 1,
            Self::OutForDelivery => 2,
            Self::Delivered | Self::Returned | Self::Cancelled => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Returned | Self::Cancelled)
    }

    /// Forward moves only; `returned`/`cancelled` from any non-terminal state.
    ///
    /// `assigned → assigned` is allowed (re-assignment).
    pub fn can_advance_to(&self, next: ShipmentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Returned | Self::Cancelled => true,
            Self::Pending => false,
            Self::Assigned => matches!(self, Self::Pending | Self::Assigned),
            Self::OutForDelivery => next.rank() > self.rank(),
            Self::Delivered => matches!(self, Self::OutForDelivery),
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized delivery address
///
/// Built from the order's loose address payload; see
/// `fulfillment::address` in the server for the alias rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub instructions: Option<String>,
}

impl DeliveryAddress {
    pub fn geo(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Shipment {
    pub id: i64,
    pub organization_id: i64,
    pub branch_id: i64,
    pub tracking_number: String,
    /// "order"
    pub source_type: String,
    pub source_id: i64,
    pub recipient_name: String,
    pub recipient_phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub instructions: Option<String>,
    pub vehicle_id: Option<i64>,
    pub driver_id: Option<i64>,
    pub status: ShipmentStatus,
    pub estimated_delivery_at: Option<i64>,
    pub picked_up_at: Option<i64>,
    pub dispatched_at: Option<i64>,
    pub delivered_at: Option<i64>,
    /// `{"assignment": {vehicle_id, driver_id, assigned_at}}`
    #[cfg_attr(feature = "db", sqlx(json))]
    pub metadata: Value,
    pub created_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Shipment {
    pub fn address(&self) -> DeliveryAddress {
        DeliveryAddress {
            address_line: self.address_line.clone(),
            city: self.city.clone(),
            region: self.region.clone(),
            neighborhood: self.neighborhood.clone(),
            postal_code: self.postal_code.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            instructions: self.instructions.clone(),
        }
    }
}

/// Insert payload built by the tracker
#[derive(Debug, Clone)]
pub struct ShipmentCreate {
    pub tracking_number: String,
    pub source_type: String,
    pub source_id: i64,
    pub recipient_name: String,
    pub recipient_phone: Option<String>,
    pub address: DeliveryAddress,
    pub estimated_delivery_at: Option<i64>,
    pub created_by: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum TransportEventType {
    Created,
    Assigned,
    PickedUp,
    Delivered,
    DeliveryFailed,
    Returned,
    Cancelled,
}

/// Append-only audit row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TransportEvent {
    pub id: i64,
    pub shipment_id: i64,
    pub event_type: TransportEventType,
    pub description: String,
    pub actor_id: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub payload: Value,
    pub occurred_at: i64,
}

#[derive(Debug, Clone)]
pub struct TransportEventCreate {
    pub shipment_id: i64,
    pub event_type: TransportEventType,
    pub description: String,
    pub actor_id: i64,
    pub geo: Option<GeoPoint>,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum FailureReason {
    CustomerAbsent,
    WrongAddress,
    Refused,
    Inaccessible,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliveryAttempt {
    pub id: i64,
    pub shipment_id: i64,
    /// 1-based, unique per shipment
    pub attempt_number: i64,
    pub driver_id: i64,
    pub reason: FailureReason,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_ref: Option<String>,
    pub attempted_at: i64,
}

/// Failed attempt input (driver app)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedAttemptInput {
    pub reason: FailureReason,
    pub notes: Option<String>,
    pub geo: Option<GeoPoint>,
    pub photo_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProofOfDelivery {
    pub id: i64,
    pub shipment_id: i64,
    pub recipient_name: String,
    pub recipient_document: Option<String>,
    pub signature_ref: Option<String>,
    pub photo_ref: Option<String>,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub captured_by: i64,
    pub delivered_at: i64,
}

/// Proof captured at the door
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofInput {
    pub recipient_name: String,
    pub recipient_document: Option<String>,
    pub signature_ref: Option<String>,
    pub photo_ref: Option<String>,
    pub notes: Option<String>,
    pub geo: Option<GeoPoint>,
}

/// Delivery KPIs over a time window
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryStats {
    pub total: i64,
    pub pending: i64,
    pub assigned: i64,
    pub out_for_delivery: i64,
    pub delivered: i64,
    pub returned: i64,
    pub cancelled: i64,
    pub failed_attempts: i64,
    /// Pickup → delivered, minutes; `None` without completed deliveries
    pub avg_delivery_minutes: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ShipmentStatus::*;

    #[test]
    fn test_forward_path() {
        assert!(Pending.can_advance_to(Assigned));
        assert!(Assigned.can_advance_to(OutForDelivery));
        assert!(OutForDelivery.can_advance_to(Delivered));
    }

    #[test]
    fn test_reassignment_allowed() {
        assert!(Assigned.can_advance_to(Assigned));
        assert!(!OutForDelivery.can_advance_to(Assigned));
    }

    #[test]
    fn test_never_moves_backwards() {
        assert!(!Assigned.can_advance_to(Pending));
        assert!(!OutForDelivery.can_advance_to(Pending));
        assert!(!Pending.can_advance_to(Delivered));
    }

    #[test]
    fn test_diversions_from_non_terminal() {
        for from in [Pending, Assigned, OutForDelivery] {
            assert!(from.can_advance_to(Returned));
            assert!(from.can_advance_to(Cancelled));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [Delivered, Returned, Cancelled] {
            assert!(from.is_terminal());
            for to in [Pending, Assigned, OutForDelivery, Delivered, Returned, Cancelled] {
                assert!(!from.can_advance_to(to), "{from} → {to}");
            }
        }
    }

    #[test]
    fn test_address_geo_requires_both_coordinates() {
        let mut addr = DeliveryAddress {
            latitude: Some(4.6),
            ..Default::default()
        };
        assert!(addr.geo().is_none());
        addr.longitude = Some(-74.1);
        assert_eq!(
            addr.geo(),
            Some(GeoPoint {
                latitude: 4.6,
                longitude: -74.1
            })
        );
    }
}
