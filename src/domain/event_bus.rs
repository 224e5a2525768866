//! Broadcast channel for addressed chat events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel of
//! [`Envelope`]s. The service resolves room membership at publish time,
//! so each WebSocket connection only checks whether its own session is
//! among the recipients.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::broadcast;

use super::{ChatEvent, SessionId};

/// Sessions an event is addressed to.
#[derive(Debug, Clone)]
pub enum Recipients {
    /// A single session (request answers, invitations).
    Session(SessionId),
    /// Every member of a room at publish time.
    Sessions(Arc<HashSet<SessionId>>),
}

impl Recipients {
    /// Returns `true` if `sid` should receive the event.
    #[must_use]
    pub fn includes(&self, sid: SessionId) -> bool {
        match self {
            Self::Session(target) => *target == sid,
            Self::Sessions(set) => set.contains(&sid),
        }
    }
}

/// An event together with its recipients.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Who receives the event.
    pub recipients: Recipients,
    /// The event, shared between receivers.
    pub event: Arc<ChatEvent>,
}

impl Envelope {
    /// Addresses `event` to a single session.
    #[must_use]
    pub fn to_session(sid: SessionId, event: ChatEvent) -> Self {
        Self {
            recipients: Recipients::Session(sid),
            event: Arc::new(event),
        }
    }

    /// Addresses `event` to a set of sessions.
    #[must_use]
    pub fn to_sessions(sids: HashSet<SessionId>, event: ChatEvent) -> Self {
        Self {
            recipients: Recipients::Sessions(Arc::new(sids)),
            event: Arc::new(event),
        }
    }
}

/// Broadcast bus for [`Envelope`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest envelopes are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Envelope>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an envelope to all subscribers.
    ///
    /// Returns the number of receivers that got it. Without receivers
    /// the envelope is silently dropped.
    pub fn publish(&self, envelope: Envelope) -> usize {
        tracing::trace!(event = envelope.event.event_name(), "publishing chat event");
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future envelopes.
    ///
    /// Each WebSocket connection calls this once, before its session is
    /// registered, so it never misses its own join events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
