//! Application state for the API server

use crate::Mirror;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; [`Mirror`] clones share the same index.
#[derive(Clone)]
pub struct AppState {
    /// The mirror whose index is served
    pub mirror: Mirror,
}

impl AppState {
    /// Create a new AppState
    pub fn new(mirror: Mirror) -> Self {
        Self { mirror }
    }
}
