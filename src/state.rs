// src/state.rs
use std::sync::Arc;

use crate::services::provider::ChatProvider;
use crate::services::relay::ChatRelay;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub relay: ChatRelay,
}

impl AppState {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            relay: ChatRelay::new(provider),
        }
    }
}
