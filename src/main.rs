//! chatroom-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use chatroom_gateway::api;
use chatroom_gateway::app_state::AppState;
use chatroom_gateway::config::{ChatConfig, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ChatConfig::from_env().context("invalid LISTEN_ADDR")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let listen_addr = config.listen_addr;
    tracing::info!(
        addr = %listen_addr,
        block_by_ip = config.block_by_ip,
        max_message_bytes = config.max_message_bytes,
        "starting chatroom-gateway"
    );

    // Build service graph and router
    let app = api::build_app(AppState::from_config(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
