//! Application state for dependency injection.

use std::sync::Arc;

use crate::service::IdentityService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn IdentityService>,
}

impl AppState {
    /// Create new app state.
    pub fn new(service: Arc<dyn IdentityService>) -> Self {
        Self { service }
    }
}
