//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Scope errors
/// - 4xxx: Online order errors
/// - 5xxx: Fulfillment step errors
/// - 6xxx: Shipment errors
/// - 7xxx: Fleet errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Scope errors (1xxx)
    Scope,
    /// Online order errors (4xxx)
    Order,
    /// Fulfillment step errors (5xxx)
    Fulfillment,
    /// Shipment errors (6xxx)
    Shipment,
    /// Fleet errors (7xxx)
    Fleet,
    /// System errors (9xxx), and the unassigned 2xxx/3xxx/8xxx ranges
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Scope,
            4000..5000 => Self::Order,
            5000..6000 => Self::Fulfillment,
            6000..7000 => Self::Shipment,
            7000..8000 => Self::Fleet,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Scope => "scope",
            Self::Order => "order",
            Self::Fulfillment => "fulfillment",
            Self::Shipment => "shipment",
            Self::Fleet => "fleet",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
