//! Fulfillment API 模块 (对账)

use axum::{Json, Router, extract::State, routing::get};

use crate::api::context::RequestContext;
use crate::core::ServerState;
use crate::fulfillment::{ReconciliationReport, report};
use crate::utils::{ApiResponse, AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/fulfillment/reconciliation", get(reconciliation))
}

/// GET /api/fulfillment/reconciliation - 部分确认 / 孤立记录报告
async fn reconciliation(
    State(state): State<ServerState>,
    ctx: RequestContext,
) -> AppResult<Json<ApiResponse<ReconciliationReport>>> {
    Ok(ok(report::build(state.pool(), ctx.scope).await?))
}
