//! Collaborator stores
//!
//! 订单确认流程涉及多个独立的记录归属方 (订单、销售、厨房、小费、优惠券、车队、配送)。
//! 每个归属方抽象为一个 trait，默认由 [`SqliteStore`] 实现；
//! 测试中可以替换任意一个为失败实现。

mod sqlite;

pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared::Scope;
use shared::models::{
    Coupon, CouponRedemption, DeliveryAttempt, DeliveryStats, Driver, FailedAttemptInput,
    Gratuity, GratuityCreate, GratuityLink, OnlineOrder, OnlineOrderCreate, OnlineOrderDetail,
    OrderConfirmation, OrderStatusUpdate, ProductionTicket, ProductionTicketCreate, ProofInput,
    ProofOfDelivery, RedemptionCreate, Sale, SaleCreate, SaleItemCreate, SaleItemRef, Shipment,
    ShipmentCreate, ShipmentStatus, TicketItemCreate, TransportEvent, TransportEventCreate,
    Vehicle,
};
use sqlx::SqlitePool;

use crate::db::repository::RepoResult;

/// Placed orders and their line items
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, scope: Scope, order_id: i64) -> RepoResult<Option<OnlineOrderDetail>>;

    async fn create(&self, scope: Scope, data: OnlineOrderCreate) -> RepoResult<OnlineOrderDetail>;

    /// Partial update: sale linkage, status, confirmation stamps, estimates
    async fn finalize(
        &self,
        scope: Scope,
        order_id: i64,
        data: &OrderConfirmation,
    ) -> RepoResult<OnlineOrder>;

    async fn update_status(
        &self,
        scope: Scope,
        order_id: i64,
        data: &OrderStatusUpdate,
    ) -> RepoResult<OnlineOrder>;
}

/// Point-of-sale transactions
#[async_trait]
pub trait SaleLedger: Send + Sync {
    async fn create_sale(&self, scope: Scope, data: &SaleCreate) -> RepoResult<Sale>;

    async fn create_items(
        &self,
        sale_id: i64,
        items: &[SaleItemCreate],
    ) -> RepoResult<Vec<SaleItemRef>>;
}

/// Kitchen production tickets
#[async_trait]
pub trait KitchenQueue: Send + Sync {
    async fn create_ticket(
        &self,
        scope: Scope,
        ticket: &ProductionTicketCreate,
        items: &[TicketItemCreate],
    ) -> RepoResult<ProductionTicket>;
}

/// Tip records
#[async_trait]
pub trait GratuityLedger: Send + Sync {
    async fn find_by_source_order(&self, scope: Scope, order_id: i64)
    -> RepoResult<Option<Gratuity>>;

    /// Uncorrelated placeholders naming `order_number`, oldest first
    async fn find_by_order_number(
        &self,
        scope: Scope,
        order_number: &str,
    ) -> RepoResult<Vec<Gratuity>>;

    async fn create(&self, scope: Scope, data: &GratuityCreate) -> RepoResult<Gratuity>;

    async fn link(&self, scope: Scope, id: i64, data: &GratuityLink) -> RepoResult<Gratuity>;
}

/// Coupon definitions and redemptions
#[async_trait]
pub trait CouponLedger: Send + Sync {
    async fn find_by_code(&self, scope: Scope, code: &str) -> RepoResult<Option<Coupon>>;

    async fn find_redemption(
        &self,
        scope: Scope,
        coupon_id: i64,
        sale_id: i64,
    ) -> RepoResult<Option<CouponRedemption>>;

    async fn relink_redemption(
        &self,
        scope: Scope,
        id: i64,
        sale_id: i64,
    ) -> RepoResult<CouponRedemption>;

    /// Create the redemption and increment the coupon's usage counter
    async fn redeem(&self, scope: Scope, data: &RedemptionCreate) -> RepoResult<CouponRedemption>;
}

/// Vehicles and driver credentials
#[async_trait]
pub trait FleetRegistry: Send + Sync {
    async fn find_vehicle(&self, scope: Scope, id: i64) -> RepoResult<Option<Vehicle>>;

    async fn find_driver(&self, scope: Scope, id: i64) -> RepoResult<Option<Driver>>;

    async fn occupy_vehicle(&self, scope: Scope, id: i64, driver_id: i64) -> RepoResult<Vehicle>;

    async fn release_vehicle(&self, scope: Scope, id: i64) -> RepoResult<Vehicle>;

    async fn available_vehicles(&self, scope: Scope) -> RepoResult<Vec<Vehicle>>;

    async fn available_drivers(&self, scope: Scope, now: i64) -> RepoResult<Vec<Driver>>;
}

/// Shipments, transport events, delivery attempts, proofs of delivery
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    async fn find_by_id(&self, scope: Scope, id: i64) -> RepoResult<Option<Shipment>>;

    async fn find_by_source(
        &self,
        scope: Scope,
        source_type: &str,
        source_id: i64,
    ) -> RepoResult<Option<Shipment>>;

    async fn create(&self, scope: Scope, data: &ShipmentCreate) -> RepoResult<Shipment>;

    #[allow(clippy::too_many_arguments)]
    async fn assign(
        &self,
        scope: Scope,
        id: i64,
        expected: ShipmentStatus,
        vehicle_id: i64,
        driver_id: i64,
        estimated_delivery_at: Option<i64>,
        metadata: &Value,
    ) -> RepoResult<Shipment>;

    async fn mark_picked_up(
        &self,
        scope: Scope,
        id: i64,
        expected: ShipmentStatus,
        at: i64,
    ) -> RepoResult<Shipment>;

    async fn mark_delivered(
        &self,
        scope: Scope,
        id: i64,
        expected: ShipmentStatus,
        at: i64,
    ) -> RepoResult<Shipment>;

    async fn close(
        &self,
        scope: Scope,
        id: i64,
        expected: ShipmentStatus,
        status: ShipmentStatus,
    ) -> RepoResult<Shipment>;

    async fn find_unassigned(&self, scope: Scope) -> RepoResult<Vec<Shipment>>;

    async fn append_event(&self, data: &TransportEventCreate) -> RepoResult<TransportEvent>;

    async fn events(&self, shipment_id: i64) -> RepoResult<Vec<TransportEvent>>;

    async fn append_attempt(
        &self,
        shipment_id: i64,
        driver_id: i64,
        data: &FailedAttemptInput,
    ) -> RepoResult<DeliveryAttempt>;

    async fn attempts(&self, shipment_id: i64) -> RepoResult<Vec<DeliveryAttempt>>;

    async fn capture_proof(
        &self,
        shipment_id: i64,
        captured_by: i64,
        delivered_at: i64,
        data: &ProofInput,
    ) -> RepoResult<ProofOfDelivery>;

    async fn proof(&self, shipment_id: i64) -> RepoResult<Option<ProofOfDelivery>>;

    async fn stats(&self, scope: Scope, from: i64, to: i64) -> RepoResult<DeliveryStats>;
}

/// Handles to every collaborator the orchestrator and tracker talk to
#[derive(Clone)]
pub struct Collaborators {
    pub orders: Arc<dyn OrderStore>,
    pub sales: Arc<dyn SaleLedger>,
    pub kitchen: Arc<dyn KitchenQueue>,
    pub gratuities: Arc<dyn GratuityLedger>,
    pub coupons: Arc<dyn CouponLedger>,
    pub fleet: Arc<dyn FleetRegistry>,
    pub shipments: Arc<dyn ShipmentStore>,
}

impl Collaborators {
    /// All collaborators backed by the same SQLite pool
    pub fn sqlite(pool: SqlitePool) -> Self {
        let store = Arc::new(SqliteStore::new(pool));
        Self {
            orders: store.clone(),
            sales: store.clone(),
            kitchen: store.clone(),
            gratuities: store.clone(),
            coupons: store.clone(),
            fleet: store.clone(),
            shipments: store,
        }
    }
}
