//! Shared types for the fulfillment service
//!
//! Domain models, the unified error system and small utilities used by the
//! server crate and its API clients.

pub mod error;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use types::Scope;
