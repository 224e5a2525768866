//! Domain layer: identifiers, rooms, messages, users, and the event system.
//!
//! This module contains the server-side chat model: session and message
//! identity, room naming, the in-memory chat registry, and the event bus
//! that fans events out to WebSocket connections.

pub mod chat_event;
pub mod chat_registry;
pub mod event_bus;
pub mod message;
pub mod room;
pub mod session_id;
pub mod user;
pub mod views;

pub use chat_event::ChatEvent;
pub use chat_registry::ChatRegistry;
pub use event_bus::{Envelope, EventBus, Recipients};
pub use message::{MessageDraft, MessageId, MessageKind, StoredMessage};
pub use room::RoomName;
pub use session_id::SessionId;
pub use user::ConnectedUser;
