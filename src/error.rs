//! Chat error types with HTTP status code mapping.
//!
//! [`ChatError`] is the central error type. Each variant maps to a numeric
//! code and an HTTP status for REST responses. Over WebSocket, variants
//! the user can act on become `error` events; the rest are only logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{MessageId, RoomName, SessionId};

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "invalid room name: lobby"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Chat error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                    |
/// |-----------|-------------------|--------------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request                |
/// | 2000–2999 | Not Found         | 404 Not Found                  |
/// | 4000–4999 | Permission/State  | 403 / 409 / 422                |
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// A session id did not have the expected shape.
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    /// A room name was neither the common room nor a private room.
    #[error("invalid room name: {0}")]
    InvalidRoom(String),

    /// A WebSocket frame was not a valid command.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A message carried no content.
    #[error("message is empty")]
    EmptyMessage,

    /// A private chat was requested without a usable target.
    #[error("Invalid target user specified")]
    InvalidTarget,

    /// The target of a private chat is not connected.
    #[error("User {0} not found")]
    UserNotFound(String),

    /// The acting session is not registered.
    #[error("session not connected: {0}")]
    SessionNotFound(SessionId),

    /// No message with the given id exists.
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    /// Only the author may change a message.
    #[error("message {0} belongs to another user")]
    NotMessageAuthor(MessageId),

    /// Image messages cannot be edited.
    #[error("message {0} is not editable")]
    NotEditable(MessageId),

    /// The session is not a participant of the room.
    #[error("access to room {0} denied")]
    RoomAccessDenied(RoomName),

    /// IP blocking is on and the address already has a live session.
    #[error("Only one connection per IP address is allowed")]
    IpAlreadyConnected {
        /// Address that was refused.
        ip: String,
    },
}

impl ChatError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidSessionId(_) => 1001,
            Self::InvalidRoom(_) => 1002,
            Self::InvalidRequest(_) => 1003,
            Self::EmptyMessage => 1004,
            Self::InvalidTarget => 1005,
            Self::UserNotFound(_) => 2001,
            Self::SessionNotFound(_) => 2002,
            Self::MessageNotFound(_) => 2003,
            Self::RoomAccessDenied(_) => 4001,
            Self::NotMessageAuthor(_) => 4002,
            Self::NotEditable(_) => 4003,
            Self::IpAlreadyConnected { .. } => 4009,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSessionId(_)
            | Self::InvalidRoom(_)
            | Self::InvalidRequest(_)
            | Self::EmptyMessage
            | Self::InvalidTarget => StatusCode::BAD_REQUEST,
            Self::UserNotFound(_) | Self::SessionNotFound(_) | Self::MessageNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::RoomAccessDenied(_) | Self::NotMessageAuthor(_) => StatusCode::FORBIDDEN,
            Self::NotEditable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::IpAlreadyConnected { .. } => StatusCode::CONFLICT,
        }
    }

    /// Returns `true` if a WebSocket client should receive this error as
    /// an `error` event.
    ///
    /// Edits and deletes of unknown or foreign messages and empty sends
    /// are dropped without a reply.
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        !matches!(
            self,
            Self::EmptyMessage
                | Self::MessageNotFound(_)
                | Self::NotMessageAuthor(_)
                | Self::NotEditable(_)
        )
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_errors_keep_client_wording() {
        assert_eq!(ChatError::InvalidTarget.to_string(), "Invalid target user specified");
        let sid = SessionId::new().to_string();
        assert_eq!(
            ChatError::UserNotFound(sid.clone()).to_string(),
            format!("User {sid} not found")
        );
    }

    #[test]
    fn status_codes_follow_ranges() {
        assert_eq!(
            ChatError::InvalidRoom("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ChatError::MessageNotFound(MessageId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ChatError::IpAlreadyConnected {
                ip: "1.2.3.4".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn silent_errors_are_not_reported() {
        assert!(!ChatError::EmptyMessage.is_reported());
        assert!(!ChatError::NotMessageAuthor(MessageId::new()).is_reported());
        assert!(ChatError::InvalidTarget.is_reported());
        assert!(ChatError::RoomAccessDenied(RoomName::Common).is_reported());
    }

    #[test]
    fn malformed_frames_are_reported_as_invalid_requests() {
        let err = ChatError::InvalidRequest("expected value".to_string());
        assert_eq!(err.error_code(), 1003);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_reported());
        assert_eq!(err.to_string(), "invalid request: expected value");
    }

    #[test]
    fn into_response_sets_status() {
        let response = ChatError::InvalidTarget.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
