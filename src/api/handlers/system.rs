//! System endpoints: health check and limits.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::user::MAX_NICKNAME_CHARS;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    connections: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, live WebSocket connections, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            connections: state.chat_service.event_bus().receiver_count(),
        }),
    )
}

/// Limits a client should respect.
#[derive(Debug, Serialize, ToSchema)]
pub struct LimitsResponse {
    max_message_bytes: usize,
    max_nickname_chars: usize,
    default_history_limit: usize,
}

/// `GET /config/limits` — Client-facing limits.
#[utoipa::path(
    get,
    path = "/config/limits",
    tag = "System",
    summary = "Client limits",
    description = "Largest accepted frame, nickname length, and default history page size.",
    responses(
        (status = 200, description = "Limits", body = LimitsResponse),
    )
)]
pub async fn limits_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(LimitsResponse {
        max_message_bytes: state.config.max_message_bytes,
        max_nickname_chars: MAX_NICKNAME_CHARS,
        default_history_limit: state.config.default_history_limit,
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/limits", get(limits_handler))
}
