//! Shipment tracking (self-delivery)
//!
//! # 模块结构
//!
//! - [`tracker`] - 配送单生命周期: 创建、派车、取件、签收、失败投递、退回、取消
//! - [`tracking_number`] - 运单号生成

pub mod tracker;
pub mod tracking_number;

pub use tracker::{Delivery, DispatchBoard, ShipmentTracker};

use shared::models::{ShipmentStatus, VehicleStatus};
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::orders::OrderError;

/// `source_type` of shipments created from online orders
pub const SOURCE_ORDER: &str = "order";

#[derive(Debug, Error)]
pub enum ShipmentError {
    #[error("Shipment not found: {0}")]
    NotFound(i64),

    #[error("Shipment {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    #[error("Order {0} is not a self-delivery order")]
    NotSelfDelivery(i64),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(i64),

    #[error("Vehicle {id} is {status:?}")]
    VehicleUnavailable { id: i64, status: VehicleStatus },

    #[error("Driver not found: {0}")]
    DriverNotFound(i64),

    #[error("Driver {0} is inactive or unlicensed")]
    DriverInactive(i64),

    #[error("Proof of delivery already captured for shipment {0}")]
    ProofAlreadyCaptured(i64),

    #[error("Could not allocate a unique tracking number after {0} attempts")]
    TrackingNumberExhausted(u32),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}
