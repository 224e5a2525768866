//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::ChatConfig;
use crate::service::ChatService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Chat service for all business logic.
    pub chat_service: Arc<ChatService>,
    /// Runtime configuration.
    pub config: Arc<ChatConfig>,
}

impl AppState {
    /// Builds the service graph from `config`.
    #[must_use]
    pub fn from_config(config: ChatConfig) -> Self {
        let event_bus = crate::domain::EventBus::new(config.event_bus_capacity);
        let limits = crate::service::HistoryLimits {
            default_limit: config.default_history_limit,
            join_limit: config.join_history_limit,
        };
        Self {
            chat_service: Arc::new(ChatService::new(event_bus, limits, config.block_by_ip)),
            config: Arc::new(config),
        }
    }
}
