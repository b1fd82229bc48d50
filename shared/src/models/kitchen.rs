//! Production Ticket Model (厨房工单)

use serde::{Deserialize, Serialize};

/// Aggregate ticket status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum TicketStatus {
    #[default]
    Pending,
    InProgress,
    Ready,
    Completed,
}

/// Per-item preparation status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PrepStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Served,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductionTicket {
    pub id: i64,
    pub organization_id: i64,
    pub branch_id: i64,
    pub sale_id: i64,
    /// Display number on the kitchen screen (the order number)
    pub ticket_number: String,
    pub source: String,
    pub status: TicketStatus,
    pub notes: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionTicketCreate {
    pub sale_id: i64,
    pub ticket_number: String,
    pub source: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TicketItem {
    pub id: i64,
    pub ticket_id: i64,
    pub sale_item_id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub status: PrepStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketItemCreate {
    pub sale_item_id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i32,
    pub notes: Option<String>,
}
