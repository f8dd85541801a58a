use std::sync::Arc;

use crate::config::AppConfig;
use crate::state::hub::BroadcastHub;
use crate::state::todos::TodoStore;

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub store: TodoStore,
    pub hub: BroadcastHub,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: TodoStore::new(),
            hub: BroadcastHub::new(config.ws_buffer),
            config: Arc::new(config),
        }
    }
}
