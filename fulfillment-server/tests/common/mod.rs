//! Shared fixtures: in-memory database, seeded orders, fleet, failing collaborators
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use fulfillment_server::db::DbService;
use fulfillment_server::db::repository::{RepoError, RepoResult, coupon, fleet};
use fulfillment_server::stores::{GratuityLedger, KitchenQueue, OrderStore, SqliteStore};
use fulfillment_server::{Collaborators, Config, ConfirmOptions, ServerState};
use serde_json::json;
use shared::Scope;
use shared::models::{
    Coupon, DeliveryType, DiscountType, Driver, DriverCreate, Gratuity, GratuityCreate,
    GratuityLink, OnlineOrder, OnlineOrderCreate, OnlineOrderDetail, OnlineOrderItemInput,
    OrderChannel, OrderConfirmation, OrderStatusUpdate, PaymentStatus, ProductionTicket,
    ProductionTicketCreate, TicketItemCreate, Vehicle, VehicleCreate, VehicleKind,
};

pub const SCOPE: Scope = Scope::new(1, 1);
pub const CASHIER: i64 = 42;

pub fn options() -> ConfirmOptions {
    ConfirmOptions {
        estimated_minutes: 25,
        actor_id: CASHIER,
    }
}

pub async fn state() -> ServerState {
    let db = DbService::in_memory().await.unwrap();
    ServerState::new(Config::default(), db)
}

/// State whose collaborators are patched by `patch` (SQLite for the rest)
pub async fn state_with(patch: impl FnOnce(&mut Collaborators, SqliteStore)) -> ServerState {
    let db = DbService::in_memory().await.unwrap();
    let mut collaborators = Collaborators::sqlite(db.pool.clone());
    patch(&mut collaborators, SqliteStore::new(db.pool.clone()));
    ServerState::with_collaborators(Config::default(), db, collaborators)
}

pub fn item(name: &str, quantity: i32, unit_price: f64) -> OnlineOrderItemInput {
    OnlineOrderItemInput {
        product_id: Some(100),
        product_name: name.to_string(),
        quantity,
        unit_price,
        tax_amount: 0.0,
        discount_amount: 0.0,
        modifiers: json!([]),
        notes: None,
    }
}

pub fn order_payload(number: &str, delivery_type: DeliveryType) -> OnlineOrderCreate {
    OnlineOrderCreate {
        order_number: number.to_string(),
        channel: OrderChannel::Web,
        customer_id: Some(7),
        customer_name: "Ana Gómez".to_string(),
        customer_phone: Some("+57 300 000 0000".to_string()),
        customer_email: None,
        delivery_type,
        delivery_address: json!({
            "address": "Calle 10 # 5-20",
            "city": "Bogotá",
            "department": "Cundinamarca",
            "lat": 4.6,
            "lng": -74.08,
        }),
        is_scheduled: false,
        scheduled_for: None,
        payment_status: PaymentStatus::Paid,
        payment_method: Some("card".to_string()),
        subtotal: 36000.0,
        tax_amount: 0.0,
        discount_amount: 0.0,
        delivery_fee: 0.0,
        tip_amount: 0.0,
        total: 36000.0,
        coupon_code: None,
        notes: None,
        items: vec![item("Bandeja Paisa", 1, 28000.0), item("Limonada", 2, 4000.0)],
    }
}

pub async fn create_order(state: &ServerState, data: OnlineOrderCreate) -> OnlineOrderDetail {
    state
        .collaborators
        .orders
        .create(SCOPE, data)
        .await
        .unwrap()
}

/// WO-1001: pickup, no tip, no coupon
pub async fn pickup_order(state: &ServerState) -> OnlineOrderDetail {
    create_order(state, order_payload("WO-1001", DeliveryType::Pickup)).await
}

/// WO-1002: self-delivery, tip 5000, coupon SAVE10
pub async fn delivery_order(state: &ServerState) -> OnlineOrderDetail {
    let mut data = order_payload("WO-1002", DeliveryType::SelfDelivery);
    data.tip_amount = 5000.0;
    data.discount_amount = 3600.0;
    data.total = 36000.0 - 3600.0 + 5000.0;
    data.coupon_code = Some("SAVE10".to_string());
    create_order(state, data).await
}

pub async fn save10(state: &ServerState) -> Coupon {
    coupon::create(
        state.pool(),
        SCOPE.organization_id,
        "SAVE10",
        DiscountType::Percentage,
        10.0,
        None,
    )
    .await
    .unwrap()
}

pub async fn vehicle(state: &ServerState, plate: &str) -> Vehicle {
    fleet::create_vehicle(
        state.pool(),
        SCOPE,
        &VehicleCreate {
            plate: plate.to_string(),
            kind: VehicleKind::Motorcycle,
        },
    )
    .await
    .unwrap()
}

pub async fn driver(state: &ServerState, name: &str) -> Driver {
    fleet::create_driver(
        state.pool(),
        SCOPE,
        &DriverCreate {
            name: name.to_string(),
            phone: None,
            license_number: Some("LIC-001".to_string()),
            license_expires_at: None,
        },
    )
    .await
    .unwrap()
}

pub async fn count(state: &ServerState, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(state.pool()).await.unwrap()
}

// ========== Failing collaborators ==========

fn offline(what: &str) -> RepoError {
    RepoError::Database(format!("{what} offline"))
}

pub struct FailingKitchen;

#[async_trait]
impl KitchenQueue for FailingKitchen {
    async fn create_ticket(
        &self,
        _scope: Scope,
        _ticket: &ProductionTicketCreate,
        _items: &[TicketItemCreate],
    ) -> RepoResult<ProductionTicket> {
        Err(offline("kitchen"))
    }
}

pub struct FailingGratuities;

#[async_trait]
impl GratuityLedger for FailingGratuities {
    async fn find_by_source_order(
        &self,
        _scope: Scope,
        _order_id: i64,
    ) -> RepoResult<Option<Gratuity>> {
        Err(offline("gratuity ledger"))
    }

    async fn find_by_order_number(
        &self,
        _scope: Scope,
        _order_number: &str,
    ) -> RepoResult<Vec<Gratuity>> {
        Err(offline("gratuity ledger"))
    }

    async fn create(&self, _scope: Scope, _data: &GratuityCreate) -> RepoResult<Gratuity> {
        Err(offline("gratuity ledger"))
    }

    async fn link(&self, _scope: Scope, _id: i64, _data: &GratuityLink) -> RepoResult<Gratuity> {
        Err(offline("gratuity ledger"))
    }
}

/// Real order store whose final confirmation write fails
pub struct FailingFinalize(pub Arc<SqliteStore>);

#[async_trait]
impl OrderStore for FailingFinalize {
    async fn get(&self, scope: Scope, order_id: i64) -> RepoResult<Option<OnlineOrderDetail>> {
        OrderStore::get(self.0.as_ref(), scope, order_id).await
    }

    async fn create(&self, scope: Scope, data: OnlineOrderCreate) -> RepoResult<OnlineOrderDetail> {
        OrderStore::create(self.0.as_ref(), scope, data).await
    }

    async fn finalize(
        &self,
        _scope: Scope,
        _order_id: i64,
        _data: &OrderConfirmation,
    ) -> RepoResult<OnlineOrder> {
        Err(offline("order store"))
    }

    async fn update_status(
        &self,
        scope: Scope,
        order_id: i64,
        data: &OrderStatusUpdate,
    ) -> RepoResult<OnlineOrder> {
        OrderStore::update_status(self.0.as_ref(), scope, order_id, data).await
    }
}
