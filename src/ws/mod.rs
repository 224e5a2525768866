//! WebSocket layer: connection handling and the chat wire protocol.
//!
//! The WebSocket endpoint at `/ws` carries one chat session per
//! connection: client commands in, addressed chat events out.

pub mod client_ip;
pub mod connection;
pub mod handler;
pub mod messages;

pub use messages::ClientCommand;
