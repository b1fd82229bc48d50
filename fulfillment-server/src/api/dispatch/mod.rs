//! Dispatch API 模块 (调度看板)

use axum::{Json, Router, extract::State, routing::get};

use crate::api::context::RequestContext;
use crate::core::ServerState;
use crate::shipping::DispatchBoard;
use crate::utils::{ApiResponse, AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/dispatch/board", get(board))
}

/// GET /api/dispatch/board - 可用车辆 + 可用司机 + 待派配送单
async fn board(
    State(state): State<ServerState>,
    ctx: RequestContext,
) -> AppResult<Json<ApiResponse<DispatchBoard>>> {
    Ok(ok(state.tracker.dispatch_board(ctx.scope).await?))
}
