//! Shipment API 模块 (自营配送)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/shipments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/from-order/{order_id}", post(handler::create_from_order))
        .route("/stats", get(handler::stats))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/events", get(handler::events))
        .route("/{id}/attempts", get(handler::attempts))
        .route("/{id}/proof", get(handler::proof))
        .route("/{id}/assign", post(handler::assign))
        .route("/{id}/pickup", post(handler::pickup))
        .route("/{id}/deliver", post(handler::deliver))
        .route("/{id}/failed-attempts", post(handler::failed_attempt))
        .route("/{id}/return", post(handler::mark_returned))
        .route("/{id}/cancel", post(handler::cancel))
}
