//! SQLite-backed collaborators

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

use super::{
    CouponLedger, FleetRegistry, GratuityLedger, KitchenQueue, OrderStore, SaleLedger,
    ShipmentStore,
};
use crate::db::repository::{
    RepoResult, coupon, fleet, gratuity, kitchen, online_order, sale, shipment,
};

/// One pool, every collaborator
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn get(&self, scope: Scope, order_id: i64) -> RepoResult<Option<OnlineOrderDetail>> {
        online_order::find_detail(&self.pool, scope, order_id).await
    }

    async fn create(&self, scope: Scope, data: OnlineOrderCreate) -> RepoResult<OnlineOrderDetail> {
        online_order::create(&self.pool, scope, data).await
    }

    async fn finalize(
        &self,
        scope: Scope,
        order_id: i64,
        data: &OrderConfirmation,
    ) -> RepoResult<OnlineOrder> {
        online_order::finalize(&self.pool, scope, order_id, data).await
    }

    async fn update_status(
        &self,
        scope: Scope,
        order_id: i64,
        data: &OrderStatusUpdate,
    ) -> RepoResult<OnlineOrder> {
        online_order::update_status(&self.pool, scope, order_id, data).await
    }
}

#[async_trait]
impl SaleLedger for SqliteStore {
    async fn create_sale(&self, scope: Scope, data: &SaleCreate) -> RepoResult<Sale> {
        sale::create(&self.pool, scope, data).await
    }

    async fn create_items(
        &self,
        sale_id: i64,
        items: &[SaleItemCreate],
    ) -> RepoResult<Vec<SaleItemRef>> {
        sale::create_items(&self.pool, sale_id, items).await
    }
}

#[async_trait]
impl KitchenQueue for SqliteStore {
    async fn create_ticket(
        &self,
        scope: Scope,
        ticket: &ProductionTicketCreate,
        items: &[TicketItemCreate],
    ) -> RepoResult<ProductionTicket> {
        kitchen::create_ticket(&self.pool, scope, ticket, items).await
    }
}

#[async_trait]
impl GratuityLedger for SqliteStore {
    async fn find_by_source_order(
        &self,
        scope: Scope,
        order_id: i64,
    ) -> RepoResult<Option<Gratuity>> {
        gratuity::find_by_source_order(&self.pool, scope, order_id).await
    }

    async fn find_by_order_number(
        &self,
        scope: Scope,
        order_number: &str,
    ) -> RepoResult<Vec<Gratuity>> {
        gratuity::find_by_order_number(&self.pool, scope, order_number).await
    }

    async fn create(&self, scope: Scope, data: &GratuityCreate) -> RepoResult<Gratuity> {
        gratuity::create(&self.pool, scope, data).await
    }

    async fn link(&self, scope: Scope, id: i64, data: &GratuityLink) -> RepoResult<Gratuity> {
        gratuity::link(&self.pool, scope, id, data).await
    }
}

#[async_trait]
impl CouponLedger for SqliteStore {
    async fn find_by_code(&self, scope: Scope, code: &str) -> RepoResult<Option<Coupon>> {
        coupon::find_by_code(&self.pool, scope.organization_id, code).await
    }

    async fn find_redemption(
        &self,
        scope: Scope,
        coupon_id: i64,
        sale_id: i64,
    ) -> RepoResult<Option<CouponRedemption>> {
        coupon::find_redemption(&self.pool, scope.organization_id, coupon_id, sale_id).await
    }

    async fn relink_redemption(
        &self,
        scope: Scope,
        id: i64,
        sale_id: i64,
    ) -> RepoResult<CouponRedemption> {
        coupon::relink_redemption(&self.pool, scope.organization_id, id, sale_id).await
    }

    async fn redeem(&self, scope: Scope, data: &RedemptionCreate) -> RepoResult<CouponRedemption> {
        coupon::redeem(&self.pool, scope.organization_id, data).await
    }
}

#[async_trait]
impl FleetRegistry for SqliteStore {
    async fn find_vehicle(&self, scope: Scope, id: i64) -> RepoResult<Option<Vehicle>> {
        fleet::find_vehicle(&self.pool, scope, id).await
    }

    async fn find_driver(&self, scope: Scope, id: i64) -> RepoResult<Option<Driver>> {
        fleet::find_driver(&self.pool, scope, id).await
    }

    async fn occupy_vehicle(&self, scope: Scope, id: i64, driver_id: i64) -> RepoResult<Vehicle> {
        fleet::occupy_vehicle(&self.pool, scope, id, driver_id).await
    }

    async fn release_vehicle(&self, scope: Scope, id: i64) -> RepoResult<Vehicle> {
        fleet::release_vehicle(&self.pool, scope, id).await
    }

    async fn available_vehicles(&self, scope: Scope) -> RepoResult<Vec<Vehicle>> {
        fleet::find_available_vehicles(&self.pool, scope).await
    }

    async fn available_drivers(&self, scope: Scope, now: i64) -> RepoResult<Vec<Driver>> {
        fleet::find_available_drivers(&self.pool, scope, now).await
    }
}

#[async_trait]
impl ShipmentStore for SqliteStore {
    async fn find_by_id(&self, scope: Scope, id: i64) -> RepoResult<Option<Shipment>> {
        shipment::find_by_id(&self.pool, scope, id).await
    }

    async fn find_by_source(
        &self,
        scope: Scope,
        source_type: &str,
        source_id: i64,
    ) -> RepoResult<Option<Shipment>> {
        shipment::find_by_source(&self.pool, scope, source_type, source_id).await
    }

    async fn create(&self, scope: Scope, data: &ShipmentCreate) -> RepoResult<Shipment> {
        shipment::create(&self.pool, scope, data).await
    }

    async fn assign(
        &self,
        scope: Scope,
        id: i64,
        expected: ShipmentStatus,
        vehicle_id: i64,
        driver_id: i64,
        estimated_delivery_at: Option<i64>,
        metadata: &Value,
    ) -> RepoResult<Shipment> {
        shipment::assign(
            &self.pool,
            scope,
            id,
            expected,
            vehicle_id,
            driver_id,
            estimated_delivery_at,
            metadata,
        )
        .await
    }

    async fn mark_picked_up(
        &self,
        scope: Scope,
        id: i64,
        expected: ShipmentStatus,
        at: i64,
    ) -> RepoResult<Shipment> {
        shipment::mark_picked_up(&self.pool, scope, id, expected, at).await
    }

    async fn mark_delivered(
        &self,
        scope: Scope,
        id: i64,
        expected: ShipmentStatus,
        at: i64,
    ) -> RepoResult<Shipment> {
        shipment::mark_delivered(&self.pool, scope, id, expected, at).await
    }

    async fn close(
        &self,
        scope: Scope,
        id: i64,
        expected: ShipmentStatus,
        status: ShipmentStatus,
    ) -> RepoResult<Shipment> {
        shipment::close(&self.pool, scope, id, expected, status).await
    }

    async fn find_unassigned(&self, scope: Scope) -> RepoResult<Vec<Shipment>> {
        shipment::find_unassigned(&self.pool, scope).await
    }

    async fn append_event(&self, data: &TransportEventCreate) -> RepoResult<TransportEvent> {
        shipment::insert_event(&self.pool, data).await
    }

    async fn events(&self, shipment_id: i64) -> RepoResult<Vec<TransportEvent>> {
        shipment::find_events(&self.pool, shipment_id).await
    }

    async fn append_attempt(
        &self,
        shipment_id: i64,
        driver_id: i64,
        data: &FailedAttemptInput,
    ) -> RepoResult<DeliveryAttempt> {
        shipment::insert_attempt(&self.pool, shipment_id, driver_id, data).await
    }

    async fn attempts(&self, shipment_id: i64) -> RepoResult<Vec<DeliveryAttempt>> {
        shipment::find_attempts(&self.pool, shipment_id).await
    }

    async fn capture_proof(
        &self,
        shipment_id: i64,
        captured_by: i64,
        delivered_at: i64,
        data: &ProofInput,
    ) -> RepoResult<ProofOfDelivery> {
        shipment::insert_proof(&self.pool, shipment_id, captured_by, delivered_at, data).await
    }

    async fn proof(&self, shipment_id: i64) -> RepoResult<Option<ProofOfDelivery>> {
        shipment::find_proof(&self.pool, shipment_id).await
    }

    async fn stats(&self, scope: Scope, from: i64, to: i64) -> RepoResult<DeliveryStats> {
        shipment::stats(&self.pool, scope, from, to).await
    }
}
