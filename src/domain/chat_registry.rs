//! In-memory chat state: users, room membership, and room history.
//!
//! [`ChatRegistry`] is a plain data structure; the service wraps it in a
//! lock and performs every multi-step operation under a single guard.
//! All state lives for the lifetime of the process.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::user::{ConnectedUser, normalize_nickname};
use super::views::{
    ChatStats, HistoryPage, MessageView, PrivateChatStats, UserInfo, UserSummary,
};
use super::{MessageDraft, MessageId, MessageKind, RoomName, SessionId, StoredMessage};
use crate::error::ChatError;

/// Bookkeeping for a private room that has received messages.
#[derive(Debug, Clone)]
pub struct PrivateChatInfo {
    /// Sessions the room was created for.
    pub participants: Vec<SessionId>,
    /// Time of the first message.
    pub created_at: DateTime<Utc>,
    /// Time of the latest message.
    pub last_message_at: DateTime<Utc>,
}

/// Central store for chat state.
#[derive(Debug, Default)]
pub struct ChatRegistry {
    /// Message id → room, for edits and deletes.
    message_rooms: HashMap<MessageId, RoomName>,
    /// Room → messages in send order.
    chat_history: HashMap<RoomName, Vec<StoredMessage>>,
    /// Live sessions.
    connected_users: HashMap<SessionId, ConnectedUser>,
    /// Client IP → live session on that IP.
    ip_to_session: HashMap<String, SessionId>,
    /// Private rooms that received messages.
    private_chats: HashMap<RoomName, PrivateChatInfo>,
    /// Session → rooms joined.
    user_rooms: HashMap<SessionId, HashSet<RoomName>>,
    /// Room → sessions present.
    room_participants: HashMap<RoomName, HashSet<SessionId>>,
    /// Next connect sequence number.
    next_seq: u64,
}

impl ChatRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- sessions ----------------------------------------------------------

    /// Registers a new session and places it in the common room.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::IpAlreadyConnected`] when `block_by_ip` is set
    /// and another live session already uses `ip`.
    pub fn register_user(
        &mut self,
        sid: SessionId,
        ip: &str,
        block_by_ip: bool,
    ) -> Result<(), ChatError> {
        if block_by_ip && let Some(existing) = self.ip_to_session.get(ip).copied() {
            if self.connected_users.contains_key(&existing) {
                return Err(ChatError::IpAlreadyConnected { ip: ip.to_string() });
            }
            self.ip_to_session.remove(ip);
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.connected_users
            .insert(sid, ConnectedUser::new(sid, ip.to_string(), seq));
        self.ip_to_session.insert(ip.to_string(), sid);
        self.join_room(sid, RoomName::Common);
        Ok(())
    }

    /// Removes a session from every room and from the user table.
    ///
    /// Returns the removed user with its disconnect time set, or `None`
    /// if the session was unknown.
    pub fn unregister_user(&mut self, sid: SessionId) -> Option<ConnectedUser> {
        let mut user = self.connected_users.remove(&sid)?;
        user.last_disconnect_time = Some(Utc::now());
        if self.ip_to_session.get(&user.ip_address) == Some(&sid) {
            self.ip_to_session.remove(&user.ip_address);
        }
        self.cleanup_session(sid);
        Some(user)
    }

    /// Drops `sid` from every room it joined. Empty rooms other than the
    /// common room are forgotten.
    fn cleanup_session(&mut self, sid: SessionId) {
        let Some(rooms) = self.user_rooms.remove(&sid) else {
            return;
        };
        for room in rooms {
            if let Some(members) = self.room_participants.get_mut(&room) {
                members.remove(&sid);
                if members.is_empty() && !room.is_common() {
                    self.room_participants.remove(&room);
                }
            }
        }
    }

    /// Returns the user for `sid`, if connected.
    #[must_use]
    pub fn user(&self, sid: SessionId) -> Option<&ConnectedUser> {
        self.connected_users.get(&sid)
    }

    /// Returns `true` if `sid` is connected.
    #[must_use]
    pub fn is_connected(&self, sid: SessionId) -> bool {
        self.connected_users.contains_key(&sid)
    }

    /// Returns the display name of a connected user.
    #[must_use]
    pub fn display_name_of(&self, sid: SessionId) -> String {
        self.connected_users
            .get(&sid)
            .map_or_else(|| sid.alias(), |u| u.display_name().to_string())
    }

    /// Stores a normalized nickname for `sid` and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::SessionNotFound`] if `sid` is not connected.
    pub fn set_nickname(&mut self, sid: SessionId, raw: &str) -> Result<String, ChatError> {
        let user = self
            .connected_users
            .get_mut(&sid)
            .ok_or(ChatError::SessionNotFound(sid))?;
        user.nickname = normalize_nickname(raw);
        Ok(user.nickname.clone())
    }

    // -- rooms -------------------------------------------------------------

    /// Adds `sid` to `room`. Returns `true` if it was not already a member.
    pub fn join_room(&mut self, sid: SessionId, room: RoomName) -> bool {
        self.user_rooms.entry(sid).or_default().insert(room.clone());
        self.room_participants.entry(room).or_default().insert(sid)
    }

    /// Removes `sid` from `room`. Returns `true` if it was a member.
    pub fn leave_room(&mut self, sid: SessionId, room: &RoomName) -> bool {
        if let Some(rooms) = self.user_rooms.get_mut(&sid) {
            rooms.remove(room);
        }
        self.room_participants
            .get_mut(room)
            .is_some_and(|members| members.remove(&sid))
    }

    /// Returns `true` if `sid` is currently in `room`.
    #[must_use]
    pub fn is_member(&self, sid: SessionId, room: &RoomName) -> bool {
        self.room_participants
            .get(room)
            .is_some_and(|members| members.contains(&sid))
    }

    /// Returns the sessions currently in `room`.
    #[must_use]
    pub fn members(&self, room: &RoomName) -> HashSet<SessionId> {
        self.room_participants.get(room).cloned().unwrap_or_default()
    }

    /// Returns the rooms `sid` belongs to, sorted.
    #[must_use]
    pub fn rooms_of(&self, sid: SessionId) -> Vec<RoomName> {
        let mut rooms: Vec<RoomName> = self
            .user_rooms
            .get(&sid)
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    // -- messages ----------------------------------------------------------

    /// Appends a message from `sid` to the history of the draft's room.
    ///
    /// Private rooms get a [`PrivateChatInfo`] record on their first
    /// message; later messages refresh its `last_message_at`.
    pub fn store_message(&mut self, sid: SessionId, draft: MessageDraft) -> StoredMessage {
        let message = StoredMessage {
            id: MessageId::new(),
            sid,
            data: draft.data,
            kind: draft.kind,
            timestamp: draft.timestamp.unwrap_or_else(Utc::now),
            room: draft.room,
        };

        if message.room.is_private() {
            self.private_chats
                .entry(message.room.clone())
                .and_modify(|info| info.last_message_at = message.timestamp)
                .or_insert_with(|| PrivateChatInfo {
                    participants: message.room.participants(),
                    created_at: message.timestamp,
                    last_message_at: message.timestamp,
                });
        }

        self.message_rooms.insert(message.id, message.room.clone());
        self.chat_history
            .entry(message.room.clone())
            .or_default()
            .push(message.clone());
        message
    }

    /// Returns messages of `room` newer than `since` (when given), keeping
    /// only the last `limit` (0 keeps everything).
    #[must_use]
    pub fn room_history(
        &self,
        room: &RoomName,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Vec<&StoredMessage> {
        let Some(messages) = self.chat_history.get(room) else {
            return Vec::new();
        };
        let filtered: Vec<&StoredMessage> = messages
            .iter()
            .filter(|m| since.is_none_or(|s| m.timestamp > s))
            .collect();
        if limit == 0 || filtered.len() <= limit {
            return filtered;
        }
        filtered.into_iter().rev().take(limit).rev().collect()
    }

    /// Builds a history page for `room`.
    #[must_use]
    pub fn history_page(
        &self,
        room: &RoomName,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> HistoryPage {
        HistoryPage {
            room_name: room.clone(),
            messages: self
                .room_history(room, since, limit)
                .into_iter()
                .map(|m| self.message_view(m))
                .collect(),
            total_count: self.chat_history.get(room).map_or(0, Vec::len),
        }
    }

    /// Resolves the author's current nickname and alias for `message`.
    #[must_use]
    pub fn message_view(&self, message: &StoredMessage) -> MessageView {
        let (nickname, alias) = self
            .connected_users
            .get(&message.sid)
            .map_or_else(
                || (String::new(), message.sid.alias()),
                |u| (u.nickname.clone(), u.alias.clone()),
            );
        MessageView {
            id: message.id,
            sid: message.sid,
            nickname,
            alias,
            data: message.data.clone(),
            kind: message.kind,
            timestamp: message.timestamp,
            room: message.room.clone(),
        }
    }

    fn find_message_mut(&mut self, id: MessageId) -> Result<&mut StoredMessage, ChatError> {
        let room = self
            .message_rooms
            .get(&id)
            .ok_or(ChatError::MessageNotFound(id))?;
        self.chat_history
            .get_mut(room)
            .and_then(|messages| messages.iter_mut().find(|m| m.id == id))
            .ok_or(ChatError::MessageNotFound(id))
    }

    /// Replaces the text of a message written by `sid`.
    ///
    /// Returns the room the message lives in.
    ///
    /// # Errors
    ///
    /// [`ChatError::EmptyMessage`] for empty text,
    /// [`ChatError::MessageNotFound`] for unknown ids,
    /// [`ChatError::NotMessageAuthor`] when `sid` did not write it, and
    /// [`ChatError::NotEditable`] for image messages.
    pub fn edit_message(
        &mut self,
        sid: SessionId,
        id: MessageId,
        data: String,
    ) -> Result<RoomName, ChatError> {
        if data.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let message = self.find_message_mut(id)?;
        if message.sid != sid {
            return Err(ChatError::NotMessageAuthor(id));
        }
        if message.kind != MessageKind::Text {
            return Err(ChatError::NotEditable(id));
        }
        message.data = data;
        Ok(message.room.clone())
    }

    /// Removes a message written by `sid`. Returns its room.
    ///
    /// # Errors
    ///
    /// [`ChatError::MessageNotFound`] for unknown ids and
    /// [`ChatError::NotMessageAuthor`] when `sid` did not write it.
    pub fn delete_message(&mut self, sid: SessionId, id: MessageId) -> Result<RoomName, ChatError> {
        if self.find_message_mut(id)?.sid != sid {
            return Err(ChatError::NotMessageAuthor(id));
        }
        let room = self
            .message_rooms
            .remove(&id)
            .ok_or(ChatError::MessageNotFound(id))?;
        if let Some(messages) = self.chat_history.get_mut(&room) {
            messages.retain(|m| m.id != id);
        }
        Ok(room)
    }

    // -- read models -------------------------------------------------------

    fn users_in_connect_order(&self) -> Vec<&ConnectedUser> {
        let mut users: Vec<&ConnectedUser> = self.connected_users.values().collect();
        users.sort_by_key(|u| u.seq);
        users
    }

    /// Returns the presence list in connect order.
    #[must_use]
    pub fn user_summaries(&self) -> Vec<UserSummary> {
        self.users_in_connect_order()
            .into_iter()
            .map(|u| UserSummary {
                sid: u.sid,
                alias: u.alias.clone(),
                nickname: u.nickname.clone(),
            })
            .collect()
    }

    /// Returns detailed information for every connected user.
    #[must_use]
    pub fn user_infos(&self) -> Vec<UserInfo> {
        self.users_in_connect_order()
            .into_iter()
            .map(|u| UserInfo {
                sid: u.sid,
                alias: u.alias.clone(),
                nickname: u.nickname.clone(),
                connect_time: u.connect_time,
                ip_address: u.ip_address.clone(),
                active_rooms: self.rooms_of(u.sid),
            })
            .collect()
    }

    /// Computes server-wide statistics.
    #[must_use]
    pub fn stats(&self) -> ChatStats {
        let participants_in = |room: &RoomName| self.room_participants.get(room).map_or(0, HashSet::len);
        let messages_in = |room: &RoomName| self.chat_history.get(room).map_or(0, Vec::len);

        ChatStats {
            total_messages: self.message_rooms.len(),
            total_rooms: self.chat_history.len(),
            active_private_chats: self
                .private_chats
                .keys()
                .filter(|room| participants_in(room) > 0)
                .count(),
            connected_users: self.connected_users.len(),
            room_message_counts: self
                .chat_history
                .iter()
                .map(|(room, messages)| (room.to_string(), messages.len()))
                .collect(),
            private_chat_info: self
                .private_chats
                .iter()
                .map(|(room, info)| {
                    (
                        room.to_string(),
                        PrivateChatStats {
                            participants: participants_in(room),
                            message_count: messages_in(room),
                            last_message: Some(info.last_message_at),
                            created_at: info.created_at,
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
        }
    }
}
