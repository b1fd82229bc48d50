//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`online_orders`] - 线上订单接单、确认、状态、取消
//! - [`shipments`] - 自营配送单生命周期
//! - [`dispatch`] - 调度看板
//! - [`fulfillment`] - 对账报告
//!
//! 除 `/health` 外，所有接口通过 [`context::RequestContext`] 读取
//! `X-Organization-Id` / `X-Branch-Id` / `X-Actor-Id`。

pub mod context;

pub mod dispatch;
pub mod fulfillment;
pub mod health;
pub mod online_orders;
pub mod shipments;

use axum::Router;

use crate::core::ServerState;

pub use context::RequestContext;

/// All routes, without middleware
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(online_orders::router())
        .merge(shipments::router())
        .merge(dispatch::router())
        .merge(fulfillment::router())
}
