//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use super::client_ip::resolve_client_ip;
use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to a chat session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ip = resolve_client_ip(&headers, peer);
    let chat_service = std::sync::Arc::clone(&state.chat_service);
    let max_bytes = state.config.max_message_bytes;

    tracing::debug!(%ip, "websocket upgrade requested");
    ws.max_message_size(max_bytes)
        .max_frame_size(max_bytes)
        .on_upgrade(move |socket| run_connection(socket, chat_service, ip))
}
