//! Events delivered from the server to chat sessions.
//!
//! Every state change and every request answer becomes a [`ChatEvent`]
//! published through the [`super::EventBus`]. On the wire an event is a
//! JSON object `{"event": "<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};

use super::views::{ChatStats, HistoryPage, MessageView, UserInfo, UserSummary};
use super::{MessageId, RoomName, SessionId};

/// Reason code sent when a connection is refused.
pub const REJECT_IP_ALREADY_CONNECTED: &str = "IP_ALREADY_CONNECTED";

/// Server → client event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ChatEvent {
    /// First event on every accepted connection: the session's identity.
    Session {
        /// Assigned session id.
        sid: SessionId,
        /// Default alias.
        alias: String,
    },

    /// The connection was refused and is about to close.
    ConnectionRejected {
        /// Machine-readable reason code.
        reason: String,
        /// Human-readable explanation.
        message: String,
    },

    /// Full presence list, in connect order.
    UsersUpdate {
        /// Connected users.
        users: Vec<UserSummary>,
    },

    /// A new message in a room the receiver belongs to.
    Message(MessageView),

    /// Answer to a history request or a room join.
    ChatHistoryResponse(HistoryPage),

    /// Someone opened a private chat with the receiver.
    PrivateChatInvitation {
        /// Shared private room.
        room_name: RoomName,
        /// Session that opened the chat.
        initiator_sid: SessionId,
        /// Display name of the initiator.
        initiator_name: String,
        /// The receiver.
        target_sid: SessionId,
        /// Display name of the receiver.
        target_name: String,
    },

    /// The receiver joined a private chat.
    PrivateChatJoined {
        /// Joined room.
        room_name: RoomName,
        /// The other participant (or the receiver, for a personal room).
        target_sid: SessionId,
        /// Title to show for the chat.
        target_name: String,
    },

    /// A user changed their nickname.
    NicknameUpdated {
        /// Session that changed.
        sid: SessionId,
        /// New nickname; empty when cleared.
        nickname: String,
    },

    /// A message text was edited by its author.
    MessageEdited {
        /// Edited message.
        id: MessageId,
        /// New text.
        data: String,
    },

    /// A message was deleted by its author.
    MessageDeleted {
        /// Deleted message.
        id: MessageId,
    },

    /// A request from the receiver failed.
    Error {
        /// Human-readable explanation.
        message: String,
    },

    /// Answer to a user info request.
    UserInfoResponse {
        /// Every connected user.
        users: Vec<UserInfo>,
    },

    /// Answer to a statistics request.
    ChatStatsResponse(ChatStats),
}

impl ChatEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Session { .. } => "session",
            Self::ConnectionRejected { .. } => "connection_rejected",
            Self::UsersUpdate { .. } => "users_update",
            Self::Message(_) => "message",
            Self::ChatHistoryResponse(_) => "chat_history_response",
            Self::PrivateChatInvitation { .. } => "private_chat_invitation",
            Self::PrivateChatJoined { .. } => "private_chat_joined",
            Self::NicknameUpdated { .. } => "nickname_updated",
            Self::MessageEdited { .. } => "message_edited",
            Self::MessageDeleted { .. } => "message_deleted",
            Self::Error { .. } => "error",
            Self::UserInfoResponse { .. } => "user_info_response",
            Self::ChatStatsResponse(_) => "chat_stats_response",
        }
    }

    /// Builds an error event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::MessageKind;

    #[test]
    fn wire_shape_is_event_and_data() {
        let id = MessageId::new();
        let json = serde_json::to_value(ChatEvent::MessageDeleted { id }).unwrap_or_default();
        assert_eq!(json["event"], "message_deleted");
        assert_eq!(json["data"]["id"], id.to_string());
    }

    #[test]
    fn event_name_matches_serialized_tag() {
        let events = vec![
            ChatEvent::error("boom"),
            ChatEvent::UsersUpdate { users: Vec::new() },
            ChatEvent::NicknameUpdated {
                sid: SessionId::new(),
                nickname: "neo".to_string(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap_or_default();
            assert_eq!(json["event"], event.event_name());
        }
    }

    #[test]
    fn message_view_uses_type_key() {
        let sid = SessionId::new();
        let event = ChatEvent::Message(MessageView {
            id: MessageId::new(),
            sid,
            nickname: String::new(),
            alias: sid.alias(),
            data: "hi".to_string(),
            kind: MessageKind::Text,
            timestamp: Utc::now(),
            room: RoomName::Common,
        });
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["data"]["type"], "text");
        assert_eq!(json["data"]["room"], "common_room");

        let Ok(back) = serde_json::from_value::<ChatEvent>(json) else {
            panic!("event should deserialize");
        };
        assert_eq!(back, event);
    }
}
