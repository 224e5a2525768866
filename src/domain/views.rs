//! Read models sent to clients over WebSocket and REST.
//!
//! Author nicknames are resolved when a view is built, so history replays
//! reflect the author's current nickname.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{MessageId, MessageKind, RoomName, SessionId};

/// A message as delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageView {
    /// Message identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: MessageId,
    /// Author session.
    #[schema(value_type = String)]
    pub sid: SessionId,
    /// Author nickname at read time; empty when unset or disconnected.
    #[serde(default)]
    pub nickname: String,
    /// Author alias.
    pub alias: String,
    /// Text body or image data URL.
    pub data: String,
    /// Payload kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Send time.
    pub timestamp: DateTime<Utc>,
    /// Room the message belongs to.
    #[schema(value_type = String)]
    pub room: RoomName,
}

/// Presence entry in the users list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    /// Session identifier.
    #[schema(value_type = String)]
    pub sid: SessionId,
    /// Default label.
    pub alias: String,
    /// Chosen nickname; empty when unset.
    #[serde(default)]
    pub nickname: String,
}

/// Detailed user information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    /// Session identifier.
    #[schema(value_type = String)]
    pub sid: SessionId,
    /// Default label.
    pub alias: String,
    /// Chosen nickname; empty when unset.
    #[serde(default)]
    pub nickname: String,
    /// When the session connected.
    pub connect_time: DateTime<Utc>,
    /// Resolved client IP.
    pub ip_address: String,
    /// Rooms the session currently belongs to.
    #[schema(value_type = Vec<String>)]
    pub active_rooms: Vec<RoomName>,
}

/// A slice of room history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryPage {
    /// Room the history belongs to.
    #[schema(value_type = String)]
    pub room_name: RoomName,
    /// Messages in send order.
    pub messages: Vec<MessageView>,
    /// Total messages stored for the room, before filtering.
    pub total_count: usize,
}

/// Per private chat statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PrivateChatStats {
    /// Sessions currently in the room.
    pub participants: usize,
    /// Messages stored for the room.
    pub message_count: usize,
    /// Time of the latest message.
    pub last_message: Option<DateTime<Utc>>,
    /// Time of the first message.
    pub created_at: DateTime<Utc>,
}

/// Server-wide chat statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatStats {
    /// Messages stored across all rooms.
    pub total_messages: usize,
    /// Rooms that ever received a message.
    pub total_rooms: usize,
    /// Private chats with at least one participant present.
    pub active_private_chats: usize,
    /// Sessions currently connected.
    pub connected_users: usize,
    /// Message count per room name.
    pub room_message_counts: BTreeMap<String, usize>,
    /// Details per private room name.
    pub private_chat_info: BTreeMap<String, PrivateChatStats>,
}
