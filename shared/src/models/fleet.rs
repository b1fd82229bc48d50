//! Fleet Models (vehicles & drivers)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum VehicleKind {
    Motorcycle,
    Car,
    Bicycle,
    Van,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum VehicleStatus {
    #[default]
    Available,
    InUse,
    Maintenance,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Vehicle {
    pub id: i64,
    pub organization_id: i64,
    pub branch_id: i64,
    pub plate: String,
    pub kind: VehicleKind,
    pub status: VehicleStatus,
    /// Driver currently attached (while `in_use`)
    pub current_driver_id: Option<i64>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCreate {
    pub plate: String,
    pub kind: VehicleKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Driver {
    pub id: i64,
    pub organization_id: i64,
    pub branch_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    /// Unix millis, `None` = no expiry recorded
    pub license_expires_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
}

impl Driver {
    /// Active with a license that has not expired
    pub fn can_drive_at(&self, now: i64) -> bool {
        self.is_active && self.license_expires_at.is_none_or(|exp| now < exp)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverCreate {
    pub name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub license_expires_at: Option<i64>,
}
