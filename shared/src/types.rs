//! Common types for the shared crate

use serde::{Deserialize, Serialize};

/// Organization / branch scope
///
/// Every collaborator call takes the scope explicitly; there is no ambient
/// "current organization".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub organization_id: i64,
    pub branch_id: i64,
}

impl Scope {
    pub const fn new(organization_id: i64, branch_id: i64) -> Self {
        Self {
            organization_id,
            branch_id,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "org:{}/branch:{}", self.organization_id, self.branch_id)
    }
}
