//! Chat client: session state and WebSocket transport.
//!
//! [`ClientSession`] holds everything a chat front end keeps between
//! server events: the room cache, the current conversation, the roster
//! and the chat list. It never performs I/O; [`ChatClient`] carries its
//! commands over a WebSocket.

pub mod actions;
pub mod nickname;
pub mod room_cache;
pub mod session;
pub mod transport;

pub use actions::MessageActions;
pub use nickname::NicknameEditor;
pub use room_cache::{CachedMessage, MessageBody, RoomCache};
pub use session::{ChatTarget, ClientEffect, ClientSession, SidebarEntry};
pub use transport::{ChatClient, ClientError};
