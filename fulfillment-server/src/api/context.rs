//! Request scope extractor
//!
//! | Header | 必填 | 说明 |
//! |--------|------|------|
//! | X-Organization-Id | 是 | 组织 |
//! | X-Branch-Id | 是 | 门店 |
//! | X-Actor-Id | 写操作必填 | 操作员工 |

use axum::extract::FromRequestParts;
use http::request::Parts;
use shared::Scope;

use crate::utils::AppError;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const BRANCH_HEADER: &str = "x-branch-id";
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Scope + acting employee for one request
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub scope: Scope,
    pub actor_id: Option<i64>,
}

impl RequestContext {
    /// Acting employee, required for writes
    pub fn actor(&self) -> Result<i64, AppError> {
        self.actor_id
            .ok_or_else(|| AppError::invalid_request("X-Actor-Id header is required"))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let organization_id = header_id(parts, ORGANIZATION_HEADER)?.ok_or_else(AppError::scope_missing)?;
        let branch_id = header_id(parts, BRANCH_HEADER)?.ok_or_else(AppError::scope_missing)?;
        let actor_id = header_id(parts, ACTOR_HEADER)?;
        Ok(Self {
            scope: Scope::new(organization_id, branch_id),
            actor_id,
        })
    }
}

fn header_id(parts: &Parts, name: &str) -> Result<Option<i64>, AppError> {
    let Some(value) = parts.headers.get(name) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .map(Some)
        .ok_or_else(|| AppError::scope_invalid(format!("{name} must be a positive integer")))
}
