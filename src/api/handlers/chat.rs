//! Chat read endpoints: users, statistics, room history.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{HistoryQuery, PaginationParams, UserListResponse};
use crate::app_state::AppState;
use crate::domain::RoomName;
use crate::domain::views::{ChatStats, HistoryPage};
use crate::error::{ChatError, ErrorResponse};

/// `GET /users` — Presence list in connect order.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Chat",
    summary = "List connected users",
    description = "Returns a paginated presence list in connect order.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated users", body = UserListResponse),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let users = state.chat_service.users().await;
    let (data, pagination) = params.paginate(users);
    Json(UserListResponse { data, pagination })
}

/// `GET /stats` — Server-wide chat statistics.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Chat",
    summary = "Chat statistics",
    description = "Message, room, and user counts plus per private chat details.",
    responses(
        (status = 200, description = "Current statistics", body = ChatStats),
    )
)]
pub async fn chat_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.chat_service.stats().await)
}

/// `GET /rooms/{room}/history` — Recent messages of the common room.
///
/// # Errors
///
/// Returns [`ChatError::InvalidRoom`] for malformed names and
/// [`ChatError::RoomAccessDenied`] for private rooms, which are only
/// readable by their participants over WebSocket.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room}/history",
    tag = "Chat",
    summary = "Room history",
    description = "Returns the most recent messages of a public room.",
    params(
        ("room" = String, Path, description = "Room name, e.g. `common_room`"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "History page", body = HistoryPage),
        (status = 400, description = "Invalid room name", body = ErrorResponse),
        (status = 403, description = "Private room", body = ErrorResponse),
    )
)]
pub async fn room_history(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ChatError> {
    let room: RoomName = room.parse()?;
    if room.is_private() {
        return Err(ChatError::RoomAccessDenied(room));
    }
    let page = state
        .chat_service
        .history(&room, query.since, query.clamped_limit())
        .await;
    Ok(Json(page))
}

/// Chat routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/stats", get(chat_stats))
        .route("/rooms/{room}/history", get(room_history))
}
