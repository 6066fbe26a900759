use std::sync::Arc;

use touchline_core::lifecycle::SessionEngine;
use touchline_core::store::SessionStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Owner of the current session.
    pub engine: Arc<SessionEngine>,
    /// Where completed sessions are persisted and read back.
    pub store: Arc<dyn SessionStore>,
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for progress and lifecycle events.
    pub event_bus: Arc<touchline_events::EventBus>,
}

impl AppState {
    /// Wire a fresh engine for `config` to `store`.
    pub fn new(config: ServerConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            engine: Arc::new(SessionEngine::new(config.start_policy)),
            store,
            config: Arc::new(config),
            event_bus: Arc::new(touchline_events::EventBus::default()),
        }
    }
}
