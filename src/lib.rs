//! # chatroom-gateway
//!
//! Real-time chat over WebSocket: a common room, private rooms between
//! pairs of sessions, presence lists, nicknames, and per-author message
//! editing and deletion.
//!
//! The crate has two halves. The server side keeps all chat state in
//! memory and fans events out to connected sessions. The [`client`]
//! module is the matching client-side state container: per-room message
//! caches, room switching, and the commands a user action produces.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket JSON frames, REST)
//!     │
//!     ├── WS Handler (ws/)        REST Handlers (api/)
//!     │
//!     ├── ChatService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     └── ChatRegistry (domain/)  in-memory rooms, users, history
//!
//! client/  ClientSession + ChatClient (tokio-tungstenite)
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
