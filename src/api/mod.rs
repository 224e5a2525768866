//! REST API layer: route handlers, DTOs, OpenAPI, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; the WebSocket chat
//! endpoint lives at `/ws`.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the REST endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "chatroom-gateway", description = "Real-time chat gateway"),
    paths(
        handlers::system::health_handler,
        handlers::system::limits_handler,
        handlers::chat::list_users,
        handlers::chat::chat_stats,
        handlers::chat::room_history,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        crate::domain::views::UserSummary,
        crate::domain::views::ChatStats,
        crate::domain::views::PrivateChatStats,
        crate::domain::views::HistoryPage,
        crate::domain::views::MessageView,
        crate::domain::MessageKind,
        dto::UserListResponse,
        dto::PaginationMeta,
    ))
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Request timeout answering `408 Request Timeout`.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Builds the full application: REST, WebSocket, docs, static files,
/// and the HTTP middleware stack.
pub fn build_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let static_dir = state.config.static_dir.clone();

    let mut app = Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    {
        app = app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    if let Some(dir) = static_dir {
        tracing::info!(dir = %dir.display(), "serving static client files");
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(timeout_layer(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::ChatConfig;

    fn app() -> Router {
        build_app(AppState::from_config(ChatConfig::default()))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("request should build");
        };
        let Ok(response) = app().oneshot(request).await else {
            panic!("router is infallible");
        };
        let status = response.status();
        let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body should be readable");
        };
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn health_is_served_at_root() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["connections"], 0);
    }

    #[tokio::test]
    async fn empty_server_lists_no_users() {
        let (status, body) = get_json("/api/v1/users").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!([]));
        assert_eq!(body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn common_history_starts_empty() {
        let (status, body) = get_json("/api/v1/rooms/common_room/history").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["room_name"], "common_room");
        assert_eq!(body["total_count"], 0);
    }

    #[tokio::test]
    async fn malformed_room_is_bad_request() {
        let (status, body) = get_json("/api/v1/rooms/lobby/history").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1002);
    }

    #[tokio::test]
    async fn slow_requests_time_out_with_408() {
        let slow = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(20)));
        let Ok(request) = Request::builder().uri("/slow").body(Body::empty()) else {
            panic!("request should build");
        };
        let Ok(response) = slow.oneshot(request).await else {
            panic!("router is infallible");
        };
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn openapi_lists_chat_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/rooms/{room}/history"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
