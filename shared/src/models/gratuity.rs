//! Gratuity (tip) Model

use serde::{Deserialize, Serialize};

/// Actor id the ordering front-end writes on records it pre-creates
pub const UPSTREAM_ACTOR_ID: i64 = 0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum TipType {
    Online,
    Cash,
    Card,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Gratuity {
    pub id: i64,
    pub organization_id: i64,
    pub branch_id: i64,
    /// NULL while only the front-end placeholder exists
    pub sale_id: Option<i64>,
    /// Explicit correlation to the online order
    pub source_order_id: Option<i64>,
    pub amount: f64,
    pub tip_type: TipType,
    pub recorded_by: i64,
    /// Legacy correlation: upstream embeds the order number here
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Gratuity {
    pub fn is_upstream_placeholder(&self) -> bool {
        self.sale_id.is_none() && self.recorded_by == UPSTREAM_ACTOR_ID
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GratuityCreate {
    pub sale_id: Option<i64>,
    pub source_order_id: Option<i64>,
    pub amount: f64,
    pub tip_type: TipType,
    pub recorded_by: i64,
    pub notes: Option<String>,
}

/// In-place update applied when a placeholder is reconciled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GratuityLink {
    pub sale_id: i64,
    pub source_order_id: i64,
    pub recorded_by: i64,
}
