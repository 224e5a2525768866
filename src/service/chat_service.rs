//! Chat service: orchestrates chat operations and emits events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::views::{ChatStats, HistoryPage, MessageView, UserInfo, UserSummary};
use crate::domain::{
    ChatEvent, ChatRegistry, Envelope, EventBus, MessageDraft, MessageId, RoomName, SessionId,
};
use crate::error::ChatError;

/// History sizes used when a request does not name one.
#[derive(Debug, Clone, Copy)]
pub struct HistoryLimits {
    /// Limit for explicit history requests.
    pub default_limit: usize,
    /// Limit for the replay sent when a session joins a room.
    pub join_limit: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            default_limit: 50,
            join_limit: 100,
        }
    }
}

/// Orchestration layer for all chat operations.
///
/// Owns the [`ChatRegistry`] behind a single lock and the [`EventBus`]
/// for event emission. Every mutation follows the pattern: take the
/// write lock → update state → publish events → release. Publishing
/// under the lock keeps event order identical to state order.
#[derive(Debug, Clone)]
pub struct ChatService {
    registry: Arc<RwLock<ChatRegistry>>,
    event_bus: EventBus,
    limits: HistoryLimits,
    block_by_ip: bool,
}

impl ChatService {
    /// Creates a new `ChatService`.
    #[must_use]
    pub fn new(event_bus: EventBus, limits: HistoryLimits, block_by_ip: bool) -> Self {
        Self {
            registry: Arc::new(RwLock::new(ChatRegistry::new())),
            event_bus,
            limits,
            block_by_ip,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    fn send_to(&self, sid: SessionId, event: ChatEvent) {
        let _ = self.event_bus.publish(Envelope::to_session(sid, event));
    }

    fn send_to_room(&self, registry: &ChatRegistry, room: &RoomName, event: ChatEvent) {
        let members = registry.members(room);
        if members.is_empty() {
            return;
        }
        let _ = self.event_bus.publish(Envelope::to_sessions(members, event));
    }

    fn broadcast_users(&self, registry: &ChatRegistry) {
        self.send_to_room(
            registry,
            &RoomName::Common,
            ChatEvent::UsersUpdate {
                users: registry.user_summaries(),
            },
        );
    }

    /// Registers a new session from `ip` and announces it.
    ///
    /// The new session first receives its own `session` event, then the
    /// common room receives the updated users list.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::IpAlreadyConnected`] when IP blocking is on
    /// and `ip` already has a live session.
    pub async fn connect(&self, ip: &str) -> Result<SessionId, ChatError> {
        let sid = SessionId::new();
        let mut registry = self.registry.write().await;
        if let Err(err) = registry.register_user(sid, ip, self.block_by_ip) {
            tracing::warn!(%ip, "connection rejected: ip already has a live session");
            return Err(err);
        }

        self.send_to(
            sid,
            ChatEvent::Session {
                sid,
                alias: sid.alias(),
            },
        );
        self.broadcast_users(&registry);

        tracing::info!(%sid, %ip, "session connected");
        Ok(sid)
    }

    /// Removes a session and announces the new users list.
    pub async fn disconnect(&self, sid: SessionId) {
        let mut registry = self.registry.write().await;
        let Some(user) = registry.unregister_user(sid) else {
            return;
        };
        self.broadcast_users(&registry);
        tracing::info!(
            %sid,
            ip = %user.ip_address,
            last_disconnect_time = ?user.last_disconnect_time,
            "session disconnected"
        );
    }

    /// Stores a message and delivers it to everyone in its room.
    ///
    /// # Errors
    ///
    /// [`ChatError::EmptyMessage`] for empty content,
    /// [`ChatError::RoomAccessDenied`] when the room is private and does
    /// not include the sender, and [`ChatError::SessionNotFound`] for an
    /// unregistered sender.
    pub async fn post_message(
        &self,
        sid: SessionId,
        draft: MessageDraft,
    ) -> Result<MessageView, ChatError> {
        if draft.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if !draft.room.admits(sid) {
            return Err(ChatError::RoomAccessDenied(draft.room));
        }

        let mut registry = self.registry.write().await;
        if !registry.is_connected(sid) {
            return Err(ChatError::SessionNotFound(sid));
        }
        let stored = registry.store_message(sid, draft);
        let view = registry.message_view(&stored);
        self.send_to_room(&registry, &stored.room, ChatEvent::Message(view.clone()));

        tracing::debug!(%sid, room = %stored.room, id = %stored.id, kind = ?stored.kind, "message posted");
        Ok(view)
    }

    /// Opens (or re-opens) the private chat between `sid` and `target`.
    ///
    /// `target` may be `sid` itself, which opens the personal room. A
    /// target that was not yet in the room is pulled in and receives a
    /// `private_chat_invitation`. The requester then receives the room
    /// history followed by `private_chat_joined`.
    ///
    /// # Errors
    ///
    /// [`ChatError::InvalidTarget`] when `target` is blank and
    /// [`ChatError::UserNotFound`] when it names no connected session.
    pub async fn join_private_chat(&self, sid: SessionId, target: &str) -> Result<RoomName, ChatError> {
        let raw = target.trim();
        if raw.is_empty() {
            tracing::warn!(%sid, "private chat requested without target");
            return Err(ChatError::InvalidTarget);
        }
        let target: SessionId = raw
            .parse()
            .map_err(|_| ChatError::UserNotFound(raw.to_string()))?;

        let mut registry = self.registry.write().await;
        if !registry.is_connected(sid) {
            return Err(ChatError::SessionNotFound(sid));
        }
        if target != sid && !registry.is_connected(target) {
            tracing::warn!(%sid, %target, "private chat target not connected");
            return Err(ChatError::UserNotFound(raw.to_string()));
        }

        let room = RoomName::private(sid, target);
        if registry.join_room(sid, room.clone()) {
            tracing::debug!(%sid, %room, "entered private room");
        }

        if target != sid && registry.join_room(target, room.clone()) {
            tracing::debug!(sid = %target, %room, "entered private room by invitation");
            self.send_to(
                target,
                ChatEvent::PrivateChatInvitation {
                    room_name: room.clone(),
                    initiator_sid: sid,
                    initiator_name: registry.display_name_of(sid),
                    target_sid: target,
                    target_name: registry.display_name_of(target),
                },
            );
        }

        // Unset for a live session: the join replays the last `join_limit` messages.
        let since = registry.user(sid).and_then(|u| u.last_disconnect_time);
        let page = registry.history_page(&room, since, self.limits.join_limit);
        self.send_to(sid, ChatEvent::ChatHistoryResponse(page));

        let target_name = if target == sid {
            format!("{} (Personal Time)", registry.display_name_of(sid))
        } else {
            registry.display_name_of(target)
        };
        self.send_to(
            sid,
            ChatEvent::PrivateChatJoined {
                room_name: room.clone(),
                target_sid: target,
                target_name,
            },
        );

        tracing::info!(%sid, %room, "joined private chat");
        Ok(room)
    }

    /// Re-enters the common room and replays its recent history.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::SessionNotFound`] for an unregistered session.
    pub async fn join_common_room(&self, sid: SessionId) -> Result<(), ChatError> {
        let mut registry = self.registry.write().await;
        if !registry.is_connected(sid) {
            return Err(ChatError::SessionNotFound(sid));
        }
        registry.join_room(sid, RoomName::Common);
        let page = registry.history_page(&RoomName::Common, None, self.limits.join_limit);
        self.send_to(sid, ChatEvent::ChatHistoryResponse(page));
        tracing::debug!(%sid, "joined common room");
        Ok(())
    }

    /// Leaves a private room. Returns `true` if the session was in it.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidRoom`] when `room` is not a private
    /// room name.
    pub async fn leave_private_chat(&self, sid: SessionId, room: &str) -> Result<bool, ChatError> {
        let room: RoomName = room.parse()?;
        if !room.is_private() {
            return Err(ChatError::InvalidRoom(room.to_string()));
        }
        let left = self.registry.write().await.leave_room(sid, &room);
        if left {
            tracing::debug!(%sid, %room, "left private room");
        }
        Ok(left)
    }

    /// Changes the nickname of `sid` and announces it to the common room.
    ///
    /// Returns the stored (trimmed, capped) nickname.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::SessionNotFound`] for an unregistered session.
    pub async fn set_nickname(&self, sid: SessionId, nickname: &str) -> Result<String, ChatError> {
        let mut registry = self.registry.write().await;
        let nickname = registry.set_nickname(sid, nickname)?;
        self.broadcast_users(&registry);
        self.send_to_room(
            &registry,
            &RoomName::Common,
            ChatEvent::NicknameUpdated {
                sid,
                nickname: nickname.clone(),
            },
        );
        tracing::info!(%sid, %nickname, "nickname updated");
        Ok(nickname)
    }

    /// Replaces the text of a message written by `sid`.
    ///
    /// # Errors
    ///
    /// Propagates [`ChatRegistry::edit_message`] failures.
    pub async fn edit_message(
        &self,
        sid: SessionId,
        id: MessageId,
        data: String,
    ) -> Result<(), ChatError> {
        let mut registry = self.registry.write().await;
        let room = registry.edit_message(sid, id, data.clone())?;
        self.send_to_room(&registry, &room, ChatEvent::MessageEdited { id, data });
        tracing::debug!(%sid, %id, %room, "message edited");
        Ok(())
    }

    /// Deletes a message written by `sid`.
    ///
    /// # Errors
    ///
    /// Propagates [`ChatRegistry::delete_message`] failures.
    pub async fn delete_message(&self, sid: SessionId, id: MessageId) -> Result<(), ChatError> {
        let mut registry = self.registry.write().await;
        let room = registry.delete_message(sid, id)?;
        self.send_to_room(&registry, &room, ChatEvent::MessageDeleted { id });
        tracing::debug!(%sid, %id, %room, "message deleted");
        Ok(())
    }

    /// Sends `sid` a page of `room` history.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::RoomAccessDenied`] for a private room that
    /// does not include `sid`.
    pub async fn request_history(
        &self,
        sid: SessionId,
        room: RoomName,
        limit: Option<usize>,
        since: Option<DateTime<Utc>>,
    ) -> Result<(), ChatError> {
        if !room.admits(sid) {
            return Err(ChatError::RoomAccessDenied(room));
        }
        let registry = self.registry.read().await;
        let page = registry.history_page(&room, since, limit.unwrap_or(self.limits.default_limit));
        tracing::debug!(%sid, %room, returned = page.messages.len(), "history requested");
        self.send_to(sid, ChatEvent::ChatHistoryResponse(page));
        Ok(())
    }

    /// Sends `sid` the detailed users list.
    pub async fn request_user_info(&self, sid: SessionId) {
        let users = self.user_info().await;
        self.send_to(sid, ChatEvent::UserInfoResponse { users });
    }

    /// Sends `sid` the server statistics.
    pub async fn request_stats(&self, sid: SessionId) {
        let stats = self.stats().await;
        self.send_to(sid, ChatEvent::ChatStatsResponse(stats));
    }

    /// Returns a history page without delivering it.
    pub async fn history(
        &self,
        room: &RoomName,
        since: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> HistoryPage {
        self.registry
            .read()
            .await
            .history_page(room, since, limit.unwrap_or(self.limits.default_limit))
    }

    /// Returns the presence list.
    pub async fn users(&self) -> Vec<UserSummary> {
        self.registry.read().await.user_summaries()
    }

    /// Returns detailed information for every connected user.
    pub async fn user_info(&self) -> Vec<UserInfo> {
        self.registry.read().await.user_infos()
    }

    /// Returns server statistics.
    pub async fn stats(&self) -> ChatStats {
        self.registry.read().await.stats()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use tokio::sync::broadcast;

    use super::*;
    use crate::domain::MessageKind;

    fn service() -> ChatService {
        ChatService::new(EventBus::new(256), HistoryLimits::default(), false)
    }

    fn draft(room: RoomName, data: &str) -> MessageDraft {
        MessageDraft {
            data: data.to_string(),
            kind: MessageKind::Text,
            timestamp: None,
            room,
        }
    }

    /// Collects every queued event addressed to `sid`.
    fn drain_for(rx: &mut broadcast::Receiver<Envelope>, sid: SessionId) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            if envelope.recipients.includes(sid) {
                events.push((*envelope.event).clone());
            }
        }
        events
    }

    async fn connect(svc: &ChatService, ip: &str) -> SessionId {
        let Ok(sid) = svc.connect(ip).await else {
            panic!("connect should succeed");
        };
        sid
    }

    #[tokio::test]
    async fn connect_sends_session_then_users() {
        let svc = service();
        let mut rx = svc.event_bus().subscribe();
        let sid = connect(&svc, "10.0.0.1").await;

        let events = drain_for(&mut rx, sid);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ChatEvent::Session { sid: s, .. } if *s == sid));
        let ChatEvent::UsersUpdate { users } = &events[1] else {
            panic!("expected users_update, got {:?}", events[1]);
        };
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].sid, sid);
    }

    #[tokio::test]
    async fn ip_blocking_rejects_duplicate_connection() {
        let svc = ChatService::new(EventBus::new(64), HistoryLimits::default(), true);
        let _first = connect(&svc, "10.0.0.1").await;
        let second = svc.connect("10.0.0.1").await;
        assert!(matches!(second, Err(ChatError::IpAlreadyConnected { .. })));
        assert_eq!(svc.users().await.len(), 1);
    }

    #[tokio::test]
    async fn disconnect_announces_users() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let b = connect(&svc, "10.0.0.2").await;
        let mut rx = svc.event_bus().subscribe();

        svc.disconnect(a).await;
        let events = drain_for(&mut rx, b);
        let Some(ChatEvent::UsersUpdate { users }) = events.last() else {
            panic!("expected users_update");
        };
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].sid, b);
    }

    #[tokio::test]
    async fn common_message_reaches_everyone() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let b = connect(&svc, "10.0.0.2").await;
        let mut rx = svc.event_bus().subscribe();

        let Ok(view) = svc.post_message(a, draft(RoomName::Common, "hello")).await else {
            panic!("post should succeed");
        };
        assert_eq!(view.alias, a.alias());

        let Ok(envelope) = rx.try_recv() else {
            panic!("expected one envelope");
        };
        assert!(envelope.recipients.includes(a));
        assert!(envelope.recipients.includes(b));
        assert_eq!(*envelope.event, ChatEvent::Message(view));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn private_message_skips_outsiders() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let b = connect(&svc, "10.0.0.2").await;
        let c = connect(&svc, "10.0.0.3").await;
        let _ = svc.join_private_chat(a, &b.to_string()).await;
        let mut rx = svc.event_bus().subscribe();

        let room = RoomName::private(a, b);
        tokio_test::assert_ok!(svc.post_message(b, draft(room, "psst")).await);
        let Ok(envelope) = rx.try_recv() else {
            panic!("expected one envelope");
        };
        assert!(envelope.recipients.includes(a));
        assert!(envelope.recipients.includes(b));
        assert!(!envelope.recipients.includes(c));
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let result = svc.post_message(a, draft(RoomName::Common, "")).await;
        assert!(matches!(result, Err(ChatError::EmptyMessage)));
        assert_eq!(svc.stats().await.total_messages, 0);
    }

    #[tokio::test]
    async fn outsider_cannot_post_to_private_room() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let b = connect(&svc, "10.0.0.2").await;
        let c = connect(&svc, "10.0.0.3").await;
        let room = RoomName::private(a, b);
        let result = svc.post_message(c, draft(room, "intrude")).await;
        assert!(matches!(result, Err(ChatError::RoomAccessDenied(_))));
    }

    #[tokio::test]
    async fn join_private_chat_invites_target() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let b = connect(&svc, "10.0.0.2").await;
        let _ = svc.set_nickname(a, "alice").await;
        let mut rx = svc.event_bus().subscribe();

        let Ok(room) = svc.join_private_chat(a, &b.to_string()).await else {
            panic!("join should succeed");
        };
        assert_eq!(room, RoomName::private(a, b));

        let b_events = drain_for(&mut rx, b);
        let [ChatEvent::PrivateChatInvitation { initiator_sid, initiator_name, room_name, .. }] =
            b_events.as_slice()
        else {
            panic!("expected a single invitation, got {b_events:?}");
        };
        assert_eq!(*initiator_sid, a);
        assert_eq!(initiator_name, "alice");
        assert_eq!(*room_name, room);

        let mut rx = svc.event_bus().subscribe();
        let _ = svc.join_private_chat(a, &b.to_string()).await;
        assert!(drain_for(&mut rx, b).is_empty(), "second join must not re-invite");
    }

    #[tokio::test]
    async fn join_private_chat_sends_history_then_joined() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let b = connect(&svc, "10.0.0.2").await;
        let _ = svc.join_private_chat(a, &b.to_string()).await;
        let room = RoomName::private(a, b);
        let _ = svc.post_message(b, draft(room.clone(), "psst")).await;
        let mut rx = svc.event_bus().subscribe();

        let _ = svc.join_private_chat(a, &b.to_string()).await;
        let events = drain_for(&mut rx, a);
        assert_eq!(events.len(), 2);
        let ChatEvent::ChatHistoryResponse(page) = &events[0] else {
            panic!("expected history first");
        };
        assert_eq!(page.room_name, room);
        assert_eq!(page.messages.len(), 1);
        assert!(matches!(
            &events[1],
            ChatEvent::PrivateChatJoined { target_sid, .. } if *target_sid == b
        ));
    }

    #[tokio::test]
    async fn personal_room_title() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let mut rx = svc.event_bus().subscribe();
        let _ = svc.join_private_chat(a, &a.to_string()).await;

        let events = drain_for(&mut rx, a);
        let Some(ChatEvent::PrivateChatJoined { room_name, target_name, .. }) = events.last()
        else {
            panic!("expected private_chat_joined");
        };
        assert_eq!(*room_name, RoomName::personal(a));
        assert_eq!(*target_name, format!("{} (Personal Time)", a.alias()));
    }

    #[tokio::test]
    async fn join_private_chat_validates_target() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        assert!(matches!(
            svc.join_private_chat(a, "  ").await,
            Err(ChatError::InvalidTarget)
        ));
        let ghost = SessionId::new().to_string();
        let Err(err) = svc.join_private_chat(a, &ghost).await else {
            panic!("unknown target should fail");
        };
        assert_eq!(err.to_string(), format!("User {ghost} not found"));
    }

    #[tokio::test]
    async fn nickname_is_broadcast() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let b = connect(&svc, "10.0.0.2").await;
        let mut rx = svc.event_bus().subscribe();

        let Ok(nickname) = svc.set_nickname(a, "  a-very-long-nickname ").await else {
            panic!("nickname should be stored");
        };
        assert_eq!(nickname, "a-very-long-");

        let events = drain_for(&mut rx, b);
        assert!(events.iter().any(|e| matches!(e, ChatEvent::UsersUpdate { .. })));
        assert!(events.contains(&ChatEvent::NicknameUpdated { sid: a, nickname }));
    }

    #[tokio::test]
    async fn edit_and_delete_reach_room() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let b = connect(&svc, "10.0.0.2").await;
        let Ok(view) = svc.post_message(a, draft(RoomName::Common, "typo")).await else {
            panic!("post should succeed");
        };
        let mut rx = svc.event_bus().subscribe();

        tokio_test::assert_err!(svc.edit_message(b, view.id, "hijack".to_string()).await);
        tokio_test::assert_ok!(svc.edit_message(a, view.id, "fixed".to_string()).await);
        tokio_test::assert_ok!(svc.delete_message(a, view.id).await);

        let events = drain_for(&mut rx, b);
        assert_eq!(
            events,
            vec![
                ChatEvent::MessageEdited {
                    id: view.id,
                    data: "fixed".to_string()
                },
                ChatEvent::MessageDeleted { id: view.id },
            ]
        );
    }

    #[tokio::test]
    async fn history_request_respects_limit_and_access() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let b = connect(&svc, "10.0.0.2").await;
        for i in 0..5 {
            let _ = svc.post_message(a, draft(RoomName::Common, &i.to_string())).await;
        }
        let mut rx = svc.event_bus().subscribe();
        tokio_test::assert_ok!(svc.request_history(a, RoomName::Common, Some(2), None).await);
        let events = drain_for(&mut rx, a);
        let [ChatEvent::ChatHistoryResponse(page)] = events.as_slice() else {
            panic!("expected one history response");
        };
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.total_count, 5);

        let stranger_room = RoomName::private(b, SessionId::new());
        assert!(matches!(
            svc.request_history(a, stranger_room, None, None).await,
            Err(ChatError::RoomAccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn leave_private_chat_only_accepts_private_rooms() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let _ = svc.join_private_chat(a, &a.to_string()).await;
        let personal = RoomName::personal(a).to_string();

        assert!(matches!(svc.leave_private_chat(a, &personal).await, Ok(true)));
        assert!(matches!(svc.leave_private_chat(a, &personal).await, Ok(false)));
        tokio_test::assert_err!(svc.leave_private_chat(a, "common_room").await);
    }

    #[tokio::test]
    async fn stats_and_user_info_answer_requester() {
        let svc = service();
        let a = connect(&svc, "10.0.0.1").await;
        let _ = svc.post_message(a, draft(RoomName::Common, "hi")).await;
        let mut rx = svc.event_bus().subscribe();

        svc.request_stats(a).await;
        svc.request_user_info(a).await;
        let events = drain_for(&mut rx, a);
        let [ChatEvent::ChatStatsResponse(stats), ChatEvent::UserInfoResponse { users }] =
            events.as_slice()
        else {
            panic!("expected stats then user info, got {events:?}");
        };
        assert_eq!(stats.total_messages, 1);
        assert_eq!(stats.connected_users, 1);
        assert_eq!(users[0].ip_address, "10.0.0.1");
    }
}
