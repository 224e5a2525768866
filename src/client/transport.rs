//! Async WebSocket connector for the chat server.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::session::{ClientEffect, ClientSession};
use crate::domain::ChatEvent;
use crate::ws::ClientCommand;

/// Errors raised by [`ChatClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The WebSocket failed.
    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame could not be encoded or decoded.
    #[error("invalid frame: {0}")]
    Codec(#[from] serde_json::Error),
}

/// A WebSocket connection that speaks the chat protocol.
#[derive(Debug)]
pub struct ChatClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl ChatClient {
    /// Connects to a chat server, e.g. `ws://127.0.0.1:5555/ws`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the handshake fails.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (socket, _response) = connect_async(url).await?;
        tracing::debug!(%url, "chat client connected");
        Ok(Self { socket })
    }

    /// Sends one command.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub async fn send(&mut self, command: &ClientCommand) -> Result<(), ClientError> {
        let json = serde_json::to_string(command)?;
        self.socket.send(Message::text(json)).await?;
        Ok(())
    }

    /// Waits for the next server event. Returns `None` once the server
    /// closed the connection. Control frames are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or a text frame is not a valid
    /// event.
    pub async fn next_event(&mut self) -> Option<Result<ChatEvent, ClientError>> {
        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(text.as_str()).map_err(ClientError::from));
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }
        }
        None
    }

    /// Sends the commands among `effects` and returns the remaining
    /// user-facing effects.
    ///
    /// # Errors
    ///
    /// Returns the first send error.
    pub async fn perform(
        &mut self,
        effects: Vec<ClientEffect>,
    ) -> Result<Vec<ClientEffect>, ClientError> {
        let mut rest = Vec::new();
        for effect in effects {
            match effect {
                ClientEffect::Send(command) => self.send(&command).await?,
                other => rest.push(other),
            }
        }
        Ok(rest)
    }

    /// Reads one event, applies it to `session`, and sends whatever the
    /// session asks for. Returns the user-facing effects, or `None` once
    /// the connection closed.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, decoding, or sending fails.
    pub async fn pump(
        &mut self,
        session: &mut ClientSession,
    ) -> Option<Result<Vec<ClientEffect>, ClientError>> {
        let event = match self.next_event().await? {
            Ok(event) => event,
            Err(err) => return Some(Err(err)),
        };
        let effects = session.handle(event);
        Some(self.perform(effects).await)
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the close frame cannot be sent.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        Ok(())
    }
}
