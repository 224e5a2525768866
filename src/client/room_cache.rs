//! Per-room message replay cache kept by a client session.
//!
//! Each room holds its messages in arrival order with no duplicate ids.
//! The cache lives as long as the session object; a reconnect starts
//! from an empty one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::user::display_name;
use crate::domain::views::MessageView;
use crate::domain::{MessageId, MessageKind, RoomName, SessionId};

/// Suffix appended to the author label of one's own messages.
pub const OWN_SUFFIX: &str = " (you)";

/// Renderable body of a cached message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Plain text.
    Text(String),
    /// Image data URL.
    Image(String),
}

impl MessageBody {
    /// Returns the text, or `None` for images.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Image(_) => None,
        }
    }
}

/// A message as the client renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Author session.
    pub sid: SessionId,
    /// Author label, with [`OWN_SUFFIX`] for one's own messages.
    pub author: String,
    /// Whether the local session wrote it.
    pub own: bool,
    /// Body.
    pub body: MessageBody,
    /// Send time.
    pub timestamp: DateTime<Utc>,
}

/// Builds the author label shown above a message.
#[must_use]
pub fn author_label(nickname: &str, alias: &str, sid: SessionId, own: bool) -> String {
    let base = if alias.is_empty() && nickname.is_empty() {
        sid.alias()
    } else {
        display_name(nickname, alias).to_string()
    };
    if own { format!("{base}{OWN_SUFFIX}") } else { base }
}

impl CachedMessage {
    /// Converts a server view, marking it as own when `me` wrote it.
    #[must_use]
    pub fn from_view(view: &MessageView, me: Option<SessionId>) -> Self {
        let own = me == Some(view.sid);
        Self {
            id: view.id,
            sid: view.sid,
            author: author_label(&view.nickname, &view.alias, view.sid, own),
            own,
            body: match view.kind {
                MessageKind::Text => MessageBody::Text(view.data.clone()),
                MessageKind::Image => MessageBody::Image(view.data.clone()),
            },
            timestamp: view.timestamp,
        }
    }

    /// Returns `true` for image messages.
    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self.body, MessageBody::Image(_))
    }
}

/// Room → cached messages, plus a per-room "history fetched" flag.
#[derive(Debug, Default)]
pub struct RoomCache {
    rooms: HashMap<RoomName, Vec<CachedMessage>>,
    loaded: HashMap<RoomName, bool>,
}

impl RoomCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure `room` has an (empty) entry and a loaded flag.
    pub fn ensure_room(&mut self, room: &RoomName) {
        self.rooms.entry(room.clone()).or_default();
        self.loaded.entry(room.clone()).or_insert(false);
    }

    /// Returns the cached messages of `room`.
    #[must_use]
    pub fn messages(&self, room: &RoomName) -> &[CachedMessage] {
        self.rooms.get(room).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `room` already caches message `id`.
    #[must_use]
    pub fn contains(&self, room: &RoomName, id: MessageId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|messages| messages.iter().any(|m| m.id == id))
    }

    /// Finds a message in `room`.
    #[must_use]
    pub fn find(&self, room: &RoomName, id: MessageId) -> Option<&CachedMessage> {
        self.rooms.get(room)?.iter().find(|m| m.id == id)
    }

    /// Appends `message` to `room` unless its id is already cached there.
    ///
    /// Returns `true` if the message was added.
    pub fn save(&mut self, room: &RoomName, message: CachedMessage) -> bool {
        let messages = self.rooms.entry(room.clone()).or_default();
        if messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        messages.push(message);
        true
    }

    /// Replaces the cached history of `room` and marks it loaded.
    pub fn replace_history(&mut self, room: &RoomName, messages: Vec<CachedMessage>) {
        self.rooms.insert(room.clone(), Vec::with_capacity(messages.len()));
        for message in messages {
            self.save(room, message);
        }
        self.loaded.insert(room.clone(), true);
    }

    /// Sets the loaded flag of `room`.
    pub fn set_loaded(&mut self, room: &RoomName, loaded: bool) {
        self.loaded.insert(room.clone(), loaded);
    }

    /// Returns `true` once a history response for `room` was applied.
    #[must_use]
    pub fn is_loaded(&self, room: &RoomName) -> bool {
        self.loaded.get(room).copied().unwrap_or(false)
    }

    /// Replaces the text of message `id` in every room. Images are left
    /// alone. Returns the number of copies changed.
    pub fn apply_edit(&mut self, id: MessageId, text: &str) -> usize {
        let mut changed = 0;
        for message in self.rooms.values_mut().flatten() {
            if message.id == id && let MessageBody::Text(body) = &mut message.body {
                text.clone_into(body);
                changed += 1;
            }
        }
        changed
    }

    /// Removes message `id` from every room. Returns the number removed.
    pub fn apply_delete(&mut self, id: MessageId) -> usize {
        let mut removed = 0;
        for messages in self.rooms.values_mut() {
            let before = messages.len();
            messages.retain(|m| m.id != id);
            removed += before - messages.len();
        }
        removed
    }

    /// Sets the author label of every message written by `sid`.
    /// Returns the number of messages relabelled.
    pub fn relabel_author(&mut self, sid: SessionId, label: &str) -> usize {
        let mut changed = 0;
        for message in self.rooms.values_mut().flatten() {
            if message.sid == sid {
                label.clone_into(&mut message.author);
                changed += 1;
            }
        }
        changed
    }
}
