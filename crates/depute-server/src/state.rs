use std::sync::Arc;

use depute_core::{RefreshConfig, RefreshCoordinator};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RefreshCoordinator>,
    /// Shared secret guarding the trigger route. `None` disables it.
    pub token: Option<Arc<str>>,
    pub update_hour: Arc<str>,
}

impl AppState {
    pub fn new(coordinator: Arc<RefreshCoordinator>, config: &RefreshConfig) -> Self {
        Self {
            coordinator,
            token: config.token.as_deref().map(Arc::from),
            update_hour: Arc::from(config.update_hour.as_str()),
        }
    }
}
