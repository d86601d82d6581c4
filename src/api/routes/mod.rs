//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`comics`] - Indexed comics, images and index statistics
//! - [`system`] - Health, OpenAPI

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

mod comics;
mod system;

// Re-export all handlers so `routes::function_name` works from the router
pub use comics::*;
pub use system::*;

// ============================================================================
// Response Types (shared across handlers)
// ============================================================================

/// Highest id in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LatestComic {
    /// Id of the most recent indexed comic
    pub latest: u32,
}

/// Health check payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// Always `ok` when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
}
