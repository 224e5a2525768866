//! Service layer: business logic orchestration.
//!
//! [`ChatService`] coordinates chat operations on the in-memory registry
//! and emits events through the [`super::domain::EventBus`].

pub mod chat_service;

pub use chat_service::{ChatService, HistoryLimits};
