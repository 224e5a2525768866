//! WebSocket message types: client commands.
//!
//! Frames are JSON objects `{"event": "<name>", "data": {...}}`. Server
//! events are [`crate::domain::ChatEvent`]; this module holds the other
//! direction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MessageDraft, MessageId, MessageKind, RoomName};

/// Commands that carry no payload. They may arrive with `"data": {}`.
const UNIT_COMMANDS: [&str; 3] = ["join_common_room", "get_user_info", "get_chat_stats"];

/// Commands that a client can send over WebSocket.
///
/// Commands without payload are sent without a `data` key, e.g.
/// `{"event": "join_common_room"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Post a message.
    Message {
        /// Text body or image data URL.
        data: String,
        /// Payload kind; defaults to text.
        #[serde(rename = "type", default)]
        kind: MessageKind,
        /// Client send time.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
        /// Target room; defaults to the common room.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomName>,
    },

    /// Open a private chat with another session (or oneself).
    JoinPrivateChat {
        /// Target session id.
        #[serde(default)]
        target_sid: Option<String>,
    },

    /// Re-enter the common room and receive its history.
    JoinCommonRoom,

    /// Leave a private room.
    LeavePrivateChat {
        /// Room to leave.
        room_name: String,
    },

    /// Change the nickname.
    SetNickname {
        /// Requested nickname; trimmed and capped by the server.
        #[serde(default)]
        nickname: String,
    },

    /// Edit one's own text message.
    EditMessage {
        /// Message to edit.
        id: MessageId,
        /// New text.
        data: String,
    },

    /// Delete one's own message.
    DeleteMessage {
        /// Message to delete.
        id: MessageId,
    },

    /// Request a page of room history.
    GetChatHistory {
        /// Room; defaults to the common room.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_name: Option<RoomName>,
        /// Maximum messages; defaults to the server's history limit.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
        /// Only messages newer than this time.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        since_timestamp: Option<DateTime<Utc>>,
    },

    /// Request detailed information about connected users.
    GetUserInfo,

    /// Request server statistics.
    GetChatStats,
}

impl ClientCommand {
    /// Returns the wire name of the command.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::JoinPrivateChat { .. } => "join_private_chat",
            Self::JoinCommonRoom => "join_common_room",
            Self::LeavePrivateChat { .. } => "leave_private_chat",
            Self::SetNickname { .. } => "set_nickname",
            Self::EditMessage { .. } => "edit_message",
            Self::DeleteMessage { .. } => "delete_message",
            Self::GetChatHistory { .. } => "get_chat_history",
            Self::GetUserInfo => "get_user_info",
            Self::GetChatStats => "get_chat_stats",
        }
    }

    /// Parses a text frame.
    ///
    /// Unlike plain deserialization, payload-less commands also accept an
    /// empty `data` object.
    ///
    /// # Errors
    ///
    /// Returns an error when the frame is not JSON or names no known
    /// command.
    pub fn from_frame(text: &str) -> Result<Self, serde_json::Error> {
        let mut frame: serde_json::Value = serde_json::from_str(text)?;
        if let Some(fields) = frame.as_object_mut()
            && fields
                .get("event")
                .and_then(serde_json::Value::as_str)
                .is_some_and(|event| UNIT_COMMANDS.contains(&event))
            && fields
                .get("data")
                .and_then(serde_json::Value::as_object)
                .is_some_and(serde_json::Map::is_empty)
        {
            fields.remove("data");
        }
        serde_json::from_value(frame)
    }

    /// Builds a text message command for `room`, stamped now.
    #[must_use]
    pub fn text(room: RoomName, data: impl Into<String>) -> Self {
        Self::Message {
            data: data.into(),
            kind: MessageKind::Text,
            timestamp: Some(Utc::now()),
            room: Some(room),
        }
    }

    /// Builds a history request for `room`.
    #[must_use]
    pub const fn history(room: RoomName, limit: usize) -> Self {
        Self::GetChatHistory {
            room_name: Some(room),
            limit: Some(limit),
            since_timestamp: None,
        }
    }
}

/// Converts the fields of a `message` command into a draft.
#[must_use]
pub fn draft_from_parts(
    data: String,
    kind: MessageKind,
    timestamp: Option<DateTime<Utc>>,
    room: Option<RoomName>,
) -> MessageDraft {
    MessageDraft {
        data,
        kind,
        timestamp,
        room: room.unwrap_or_default(),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn message_defaults_to_text_in_common_room() {
        let Ok(cmd) =
            serde_json::from_str::<ClientCommand>(r#"{"event":"message","data":{"data":"hi"}}"#)
        else {
            panic!("minimal message should parse");
        };
        let ClientCommand::Message { data, kind, timestamp, room } = cmd else {
            panic!("expected message command");
        };
        let draft = draft_from_parts(data, kind, timestamp, room);
        assert_eq!(draft.data, "hi");
        assert_eq!(draft.kind, MessageKind::Text);
        assert_eq!(draft.room, RoomName::Common);
    }

    #[test]
    fn unit_commands_need_no_data() {
        let Ok(cmd) = serde_json::from_str::<ClientCommand>(r#"{"event":"join_common_room"}"#)
        else {
            panic!("unit command should parse");
        };
        assert_eq!(cmd, ClientCommand::JoinCommonRoom);
        let json = serde_json::to_value(&ClientCommand::GetChatStats).unwrap_or_default();
        assert_eq!(json["event"], "get_chat_stats");
    }

    #[test]
    fn history_request_parses_room_and_since() {
        let raw = r#"{"event":"get_chat_history","data":{"room_name":"common_room","limit":5,"since_timestamp":"2024-01-01T00:00:00Z"}}"#;
        let Ok(ClientCommand::GetChatHistory { room_name, limit, since_timestamp }) =
            serde_json::from_str::<ClientCommand>(raw)
        else {
            panic!("history request should parse");
        };
        assert_eq!(room_name, Some(RoomName::Common));
        assert_eq!(limit, Some(5));
        assert!(since_timestamp.is_some());
    }

    #[test]
    fn unit_commands_accept_empty_payload() {
        for raw in [
            r#"{"event":"get_user_info","data":{}}"#,
            r#"{"event":"get_user_info"}"#,
            r#"{"event":"get_user_info","data":null}"#,
        ] {
            let Ok(cmd) = ClientCommand::from_frame(raw) else {
                panic!("{raw} should parse");
            };
            assert_eq!(cmd, ClientCommand::GetUserInfo);
        }
        let Ok(cmd) = ClientCommand::from_frame(r#"{"event":"join_common_room","data":{}}"#)
        else {
            panic!("join_common_room with empty data should parse");
        };
        assert_eq!(cmd, ClientCommand::JoinCommonRoom);
        let Ok(cmd) = ClientCommand::from_frame(r#"{"event":"get_chat_stats","data":{}}"#) else {
            panic!("get_chat_stats with empty data should parse");
        };
        assert_eq!(cmd, ClientCommand::GetChatStats);
    }

    #[test]
    fn non_empty_payload_on_unit_command_is_rejected() {
        assert!(
            ClientCommand::from_frame(r#"{"event":"get_chat_stats","data":{"x":1}}"#).is_err()
        );
        assert!(ClientCommand::from_frame("[]").is_err());
    }

    #[test]
    fn from_frame_parses_payload_commands() {
        let Ok(ClientCommand::SetNickname { nickname }) =
            ClientCommand::from_frame(r#"{"event":"set_nickname","data":{"nickname":"neo"}}"#)
        else {
            panic!("set_nickname should parse");
        };
        assert_eq!(nickname, "neo");
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(serde_json::from_str::<ClientCommand>(r#"{"event":"explode"}"#).is_err());
        assert!(serde_json::from_str::<ClientCommand>("not json").is_err());
    }

    #[test]
    fn event_name_matches_serialized_tag() {
        let cmd = ClientCommand::text(RoomName::Common, "yo");
        let json = serde_json::to_value(&cmd).unwrap_or_default();
        assert_eq!(json["event"], cmd.event_name());
        assert_eq!(json["data"]["type"], "text");
    }
}
