//! Client-side chat session state.
//!
//! [`ClientSession`] is a transport-agnostic state container. Every input
//! (server event or user action) updates the state and returns the
//! [`ClientEffect`]s the caller must carry out: commands to send, alerts,
//! and private-message notices. The view is derived from the state, so
//! there is no separate render step.

use std::collections::HashSet;

use chrono::Utc;

use super::actions::{MessageActions, quote_text};
use super::nickname::{NicknameCommit, NicknameEditor};
use super::room_cache::{CachedMessage, MessageBody, RoomCache, author_label};
use crate::domain::user::display_name;
use crate::domain::views::{ChatStats, HistoryPage, MessageView, UserInfo, UserSummary};
use crate::domain::{ChatEvent, MessageId, MessageKind, RoomName, SessionId};
use crate::ws::ClientCommand;

/// Messages requested whenever a room is (re)entered.
pub const HISTORY_PAGE: usize = 50;

/// Title and sidebar label of the common room.
pub const COMMON_CHAT_TITLE: &str = "Common room";

/// Suffix of the personal room title.
pub const PERSONAL_SUFFIX: &str = " (Personal Time)";

/// Title of private-message notices.
pub const NOTICE_TITLE: &str = "New private message";

/// Which conversation the user is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChatTarget {
    /// The shared common room.
    #[default]
    Common,
    /// A private chat with a session (oneself for the personal room).
    Private(SessionId),
}

/// An entry in the chat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    /// Conversation the entry opens.
    pub target: ChatTarget,
    /// Label.
    pub name: String,
}

/// Something the caller must do after feeding an input to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEffect {
    /// Send a command to the server.
    Send(ClientCommand),
    /// Show a blocking message to the user.
    Alert(String),
    /// Someone else posted in one of our private rooms.
    PrivateMessageNotice {
        /// Notice title.
        title: String,
        /// `"name: text"`, or `"name: [Image]"` for images.
        body: String,
        /// Message the notice is about; lets repeated notices collapse.
        message_id: MessageId,
    },
}

#[derive(Debug, Clone)]
struct PendingSwitch {
    target: ChatTarget,
    name: String,
    room: Option<RoomName>,
}

/// State of one browser-like chat client.
#[derive(Debug)]
pub struct ClientSession {
    sid: Option<SessionId>,
    alias: String,
    nickname: String,
    current: ChatTarget,
    current_room: RoomName,
    title: String,
    cache: RoomCache,
    private_chats: HashSet<RoomName>,
    pending: Vec<PendingSwitch>,
    users: Vec<UserSummary>,
    user_info: Vec<UserInfo>,
    stats: Option<ChatStats>,
    sidebar: Vec<SidebarEntry>,
    nickname_editor: NicknameEditor,
    rejected: bool,
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientSession {
    /// Creates a session looking at the common room, not yet connected.
    #[must_use]
    pub fn new() -> Self {
        let mut cache = RoomCache::new();
        cache.ensure_room(&RoomName::Common);
        Self {
            sid: None,
            alias: String::new(),
            nickname: String::new(),
            current: ChatTarget::Common,
            current_room: RoomName::Common,
            title: COMMON_CHAT_TITLE.to_string(),
            cache,
            private_chats: HashSet::new(),
            pending: Vec::new(),
            users: Vec::new(),
            user_info: Vec::new(),
            stats: None,
            sidebar: vec![SidebarEntry {
                target: ChatTarget::Common,
                name: COMMON_CHAT_TITLE.to_string(),
            }],
            nickname_editor: NicknameEditor::new(),
            rejected: false,
        }
    }

    // ---- accessors ----

    /// Own session id, once the server announced it.
    #[must_use]
    pub const fn sid(&self) -> Option<SessionId> {
        self.sid
    }

    /// Label shown for oneself: nickname when set, otherwise alias.
    #[must_use]
    pub fn own_label(&self) -> &str {
        display_name(&self.nickname, &self.alias)
    }

    /// Conversation currently shown.
    #[must_use]
    pub const fn current_target(&self) -> ChatTarget {
        self.current
    }

    /// Room currently shown.
    #[must_use]
    pub const fn current_room(&self) -> &RoomName {
        &self.current_room
    }

    /// Header title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Messages of the current room, in arrival order.
    #[must_use]
    pub fn visible_messages(&self) -> &[CachedMessage] {
        self.cache.messages(&self.current_room)
    }

    /// Cached messages of any room.
    #[must_use]
    pub fn room_messages(&self, room: &RoomName) -> &[CachedMessage] {
        self.cache.messages(room)
    }

    /// Whether the current room's history has arrived.
    #[must_use]
    pub fn history_loaded(&self) -> bool {
        self.cache.is_loaded(&self.current_room)
    }

    /// Connected users, in server order.
    #[must_use]
    pub fn users(&self) -> &[UserSummary] {
        &self.users
    }

    /// Last `user_info_response`.
    #[must_use]
    pub fn user_info(&self) -> &[UserInfo] {
        &self.user_info
    }

    /// Last `chat_stats_response`.
    #[must_use]
    pub const fn stats(&self) -> Option<&ChatStats> {
        self.stats.as_ref()
    }

    /// Chat list: common room first, then private chats newest first.
    #[must_use]
    pub fn sidebar(&self) -> &[SidebarEntry] {
        &self.sidebar
    }

    /// Whether the server refused this connection.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        self.rejected
    }

    /// Whether a `private_chat_joined` was received for `room`.
    #[must_use]
    pub fn knows_private_chat(&self, room: &RoomName) -> bool {
        self.private_chats.contains(room)
    }

    // ---- connection ----

    /// Records the own identity, prepares the common and personal rooms,
    /// requests common-room history, and replays queued chat switches.
    ///
    /// A new sid means the server no longer knows the old session: every
    /// cache, chat and sidebar entry of the previous identity is dropped.
    pub fn on_connected(&mut self, sid: SessionId, alias: String) -> Vec<ClientEffect> {
        if let Some(previous) = self.sid
            && previous != sid
        {
            tracing::debug!(%previous, %sid, "new session id, dropping cached state");
            let pending = std::mem::take(&mut self.pending);
            *self = Self::new();
            self.pending = pending;
        }
        self.sid = Some(sid);
        self.alias = alias;
        self.cache.ensure_room(&RoomName::Common);
        self.cache.ensure_room(&RoomName::personal(sid));

        let mut effects = vec![ClientEffect::Send(ClientCommand::history(
            RoomName::Common,
            HISTORY_PAGE,
        ))];
        for pending in std::mem::take(&mut self.pending) {
            effects.extend(self.switch_to_chat(pending.target, &pending.name, pending.room));
        }
        tracing::debug!(%sid, replayed = effects.len().saturating_sub(1), "client session connected");
        effects
    }

    // ---- navigation ----

    /// Moves the view to another conversation.
    ///
    /// A private switch made before the own sid is known is queued and
    /// replayed by [`Self::on_connected`]. Switching to the conversation
    /// already shown does nothing.
    pub fn switch_to_chat(
        &mut self,
        target: ChatTarget,
        name: &str,
        room: Option<RoomName>,
    ) -> Vec<ClientEffect> {
        let new_room = match target {
            ChatTarget::Common => RoomName::Common,
            ChatTarget::Private(peer) => match (room, self.sid) {
                (room, None) => {
                    self.pending.push(PendingSwitch {
                        target,
                        name: name.to_string(),
                        room,
                    });
                    return Vec::new();
                }
                (Some(room), Some(_)) => room,
                (None, Some(me)) => RoomName::private(me, peer),
            },
        };

        self.cache.ensure_room(&new_room);
        if target == self.current && new_room == self.current_room {
            return Vec::new();
        }

        let room_changed = new_room != self.current_room;
        self.current = target;
        self.current_room = new_room.clone();
        name.clone_into(&mut self.title);
        self.cache.set_loaded(&new_room, false);

        let mut effects = Vec::with_capacity(2);
        if room_changed {
            let join = match target {
                ChatTarget::Common => ClientCommand::JoinCommonRoom,
                ChatTarget::Private(peer) => ClientCommand::JoinPrivateChat {
                    target_sid: Some(peer.to_string()),
                },
            };
            effects.push(ClientEffect::Send(join));
        }
        effects.push(ClientEffect::Send(ClientCommand::history(
            new_room,
            HISTORY_PAGE,
        )));
        effects
    }

    /// Opens a chat with a user from the roster: the personal room when
    /// `peer` is oneself. Adds a sidebar entry first.
    pub fn open_chat_with(&mut self, peer: SessionId) -> Vec<ClientEffect> {
        let name = self.chat_name_for(peer);
        self.add_sidebar_entry(ChatTarget::Private(peer), &name);
        self.switch_to_chat(ChatTarget::Private(peer), &name, None)
    }

    /// Switches back to the common room.
    pub fn open_common_room(&mut self) -> Vec<ClientEffect> {
        self.switch_to_chat(ChatTarget::Common, COMMON_CHAT_TITLE, None)
    }

    // ---- server events ----

    /// Applies a server event.
    pub fn handle(&mut self, event: ChatEvent) -> Vec<ClientEffect> {
        match event {
            ChatEvent::Session { sid, alias } => self.on_connected(sid, alias),
            ChatEvent::ConnectionRejected { reason, message } => {
                tracing::warn!(%reason, "connection rejected by server");
                self.rejected = true;
                vec![ClientEffect::Alert(message)]
            }
            ChatEvent::UsersUpdate { users } => {
                if let Some(me) = self.sid
                    && let Some(own) = users.iter().find(|u| u.sid == me)
                {
                    own.nickname.clone_into(&mut self.nickname);
                }
                self.users = users;
                Vec::new()
            }
            ChatEvent::Message(view) => self.on_message(&view),
            ChatEvent::ChatHistoryResponse(page) => {
                self.on_history(page);
                Vec::new()
            }
            ChatEvent::PrivateChatJoined {
                room_name,
                target_sid,
                target_name,
            } => self.on_private_chat_joined(room_name, target_sid, target_name),
            ChatEvent::PrivateChatInvitation {
                room_name,
                initiator_sid,
                initiator_name,
                ..
            } => {
                let target = ChatTarget::Private(initiator_sid);
                self.add_sidebar_entry(target, &initiator_name);
                if self.private_chats.contains(&room_name) {
                    Vec::new()
                } else {
                    self.switch_to_chat(target, &initiator_name, Some(room_name))
                }
            }
            ChatEvent::NicknameUpdated { sid, nickname } => {
                self.on_nickname_updated(sid, &nickname);
                Vec::new()
            }
            ChatEvent::MessageEdited { id, data } => {
                self.cache.apply_edit(id, &data);
                Vec::new()
            }
            ChatEvent::MessageDeleted { id } => {
                self.cache.apply_delete(id);
                Vec::new()
            }
            ChatEvent::Error { message } => vec![ClientEffect::Alert(message)],
            ChatEvent::UserInfoResponse { users } => {
                self.user_info = users;
                Vec::new()
            }
            ChatEvent::ChatStatsResponse(stats) => {
                self.stats = Some(stats);
                Vec::new()
            }
        }
    }

    fn on_message(&mut self, view: &MessageView) -> Vec<ClientEffect> {
        if self.cache.contains(&view.room, view.id) {
            return Vec::new();
        }
        self.cache
            .save(&view.room, CachedMessage::from_view(view, self.sid));

        if view.room.is_private() && Some(view.sid) != self.sid {
            let content = match view.kind {
                MessageKind::Text => view.data.as_str(),
                MessageKind::Image => "[Image]",
            };
            let author = display_name(&view.nickname, &view.alias);
            return vec![ClientEffect::PrivateMessageNotice {
                title: NOTICE_TITLE.to_string(),
                body: format!("{author}: {content}"),
                message_id: view.id,
            }];
        }
        Vec::new()
    }

    fn on_history(&mut self, page: HistoryPage) {
        let messages = page
            .messages
            .iter()
            .map(|view| CachedMessage::from_view(view, self.sid))
            .collect();
        self.cache.replace_history(&page.room_name, messages);
    }

    fn on_private_chat_joined(
        &mut self,
        room: RoomName,
        target_sid: SessionId,
        target_name: String,
    ) -> Vec<ClientEffect> {
        self.private_chats.insert(room.clone());
        self.title = target_name;
        self.cache.ensure_room(&room);
        if self.current_room == room {
            return Vec::new();
        }
        self.current = ChatTarget::Private(target_sid);
        self.current_room = room.clone();
        vec![ClientEffect::Send(ClientCommand::history(room, HISTORY_PAGE))]
    }

    fn on_nickname_updated(&mut self, sid: SessionId, nickname: &str) {
        let own = self.sid == Some(sid);
        if own {
            nickname.clone_into(&mut self.nickname);
        }
        let alias = self
            .users
            .iter()
            .find(|u| u.sid == sid)
            .map_or_else(|| sid.alias(), |u| u.alias.clone());
        for user in self.users.iter_mut().filter(|u| u.sid == sid) {
            nickname.clone_into(&mut user.nickname);
        }

        let label = author_label(nickname, &alias, sid, own);
        self.cache.relabel_author(sid, &label);

        let entry_name = if own {
            format!("{}{PERSONAL_SUFFIX}", display_name(nickname, &alias))
        } else {
            display_name(nickname, &alias).to_string()
        };
        let target = ChatTarget::Private(sid);
        if let Some(entry) = self.sidebar.iter_mut().find(|e| e.target == target) {
            entry.name.clone_from(&entry_name);
        }
        if self.current == target {
            self.title = entry_name;
        }
    }

    // ---- sidebar ----

    /// Inserts a chat right after the common room unless it is listed.
    /// Returns `true` when added.
    pub fn add_sidebar_entry(&mut self, target: ChatTarget, name: &str) -> bool {
        if self.sidebar.iter().any(|e| e.target == target) {
            return false;
        }
        let at = usize::from(!self.sidebar.is_empty());
        self.sidebar.insert(
            at,
            SidebarEntry {
                target,
                name: name.to_string(),
            },
        );
        true
    }

    fn chat_name_for(&self, peer: SessionId) -> String {
        if self.sid == Some(peer) {
            return format!("{}{PERSONAL_SUFFIX}", self.own_label());
        }
        self.users
            .iter()
            .find(|u| u.sid == peer)
            .map_or_else(
                || peer.alias(),
                |u| display_name(&u.nickname, &u.alias).to_string(),
            )
    }

    // ---- composing ----

    /// Builds a text message for the current room. Empty input sends
    /// nothing.
    #[must_use]
    pub fn compose_text(&self, input: &str) -> Option<ClientCommand> {
        if input.is_empty() {
            return None;
        }
        Some(ClientCommand::text(self.current_room.clone(), input))
    }

    /// Builds an image message from a data URL.
    #[must_use]
    pub fn compose_image(&self, data_url: &str) -> Option<ClientCommand> {
        if data_url.is_empty() {
            return None;
        }
        Some(ClientCommand::Message {
            data: data_url.to_string(),
            kind: MessageKind::Image,
            timestamp: Some(Utc::now()),
            room: Some(self.current_room.clone()),
        })
    }

    // ---- message actions ----

    /// Context menu actions for a message in the current room.
    #[must_use]
    pub fn actions_for(&self, id: MessageId) -> Option<MessageActions> {
        self.cache
            .find(&self.current_room, id)
            .map(MessageActions::for_cached)
    }

    /// Builds an edit of an own text message. Empty text sends nothing.
    #[must_use]
    pub fn edit_message(&self, id: MessageId, new_text: &str) -> Option<ClientCommand> {
        let actions = self.actions_for(id)?;
        (actions.edit && !new_text.is_empty()).then(|| ClientCommand::EditMessage {
            id,
            data: new_text.to_string(),
        })
    }

    /// Builds a deletion of an own message.
    #[must_use]
    pub fn delete_message(&self, id: MessageId) -> Option<ClientCommand> {
        self.actions_for(id)?
            .delete
            .then_some(ClientCommand::DeleteMessage { id })
    }

    /// Text to put on the clipboard for a text message.
    #[must_use]
    pub fn copy_text(&self, id: MessageId) -> Option<String> {
        let message = self.cache.find(&self.current_room, id)?;
        MessageActions::for_cached(message)
            .copy
            .then(|| message.body.text().map(str::to_string))
            .flatten()
    }

    /// Composer prefill quoting someone else's text message.
    #[must_use]
    pub fn quote(&self, id: MessageId) -> Option<String> {
        let message = self.cache.find(&self.current_room, id)?;
        match (&message.body, MessageActions::for_cached(message).quote) {
            (MessageBody::Text(text), true) => Some(quote_text(text)),
            _ => None,
        }
    }

    // ---- nickname ----

    /// Opens the nickname editor.
    pub fn begin_nickname_edit(&mut self) -> bool {
        let label = self.own_label().to_string();
        self.nickname_editor.begin(&label)
    }

    /// Saves the nickname editor. The label updates immediately; the
    /// server echoes a `nickname_updated` event.
    pub fn commit_nickname(&mut self, input: &str) -> Option<ClientEffect> {
        let NicknameCommit { command, nickname } = self.nickname_editor.commit(input)?;
        self.nickname = nickname;
        Some(ClientEffect::Send(command))
    }

    /// Closes the nickname editor without saving; returns the label to
    /// restore.
    pub fn cancel_nickname_edit(&mut self) -> Option<String> {
        self.nickname_editor.cancel()
    }
}
