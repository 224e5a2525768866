//! Chat messages as stored in room history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{RoomName, SessionId};

/// Unique identifier for a chat message (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(uuid::Uuid);

impl MessageId {
    /// Creates a new random `MessageId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for MessageId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

/// Payload kind of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text.
    #[default]
    Text,
    /// An image carried inline as a data URL.
    Image,
}

impl MessageKind {
    /// Returns `true` for text messages.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }
}

/// A message kept in the history of its room.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// Server-assigned identifier.
    pub id: MessageId,
    /// Author session.
    pub sid: SessionId,
    /// Text body or image data URL.
    pub data: String,
    /// Payload kind.
    pub kind: MessageKind,
    /// Send time as reported by the client, or receive time.
    pub timestamp: DateTime<Utc>,
    /// Room the message was posted to.
    pub room: RoomName,
}

/// A message submitted by a client, before the server stamps it.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    /// Text body or image data URL.
    pub data: String,
    /// Payload kind.
    pub kind: MessageKind,
    /// Client-side send time, if provided.
    pub timestamp: Option<DateTime<Utc>>,
    /// Target room.
    pub room: RoomName,
}

impl MessageDraft {
    /// Returns `true` when the draft carries nothing to send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
