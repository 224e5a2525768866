//! WebSocket connection loop.
//!
//! Registers the session, dispatches incoming commands to the
//! [`ChatService`], and forwards events addressed to this session.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{ClientCommand, draft_from_parts};
use crate::domain::chat_event::REJECT_IP_ALREADY_CONNECTED;
use crate::domain::{ChatEvent, RoomName, SessionId};
use crate::error::ChatError;
use crate::service::ChatService;

type WsSink = SplitSink<WebSocket, Message>;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Subscribes to the event bus before registering, so the session's
///   own `session` and `users_update` events are not missed.
/// - Reads commands from the client and dispatches them.
/// - Forwards envelopes addressed to this session.
/// - Unregisters the session when the socket closes.
pub async fn run_connection(socket: WebSocket, chat_service: Arc<ChatService>, ip: String) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut event_rx = chat_service.event_bus().subscribe();

    let sid = match chat_service.connect(&ip).await {
        Ok(sid) => sid,
        Err(err) => {
            let rejection = ChatEvent::ConnectionRejected {
                reason: REJECT_IP_ALREADY_CONNECTED.to_string(),
                message: err.to_string(),
            };
            let _ = send_event(&mut ws_tx, &rejection).await;
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_text_message(&text, sid, &chat_service).await
                            && send_event(&mut ws_tx, &reply).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%sid, error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Event from EventBus
            envelope = event_rx.recv() => {
                match envelope {
                    Ok(envelope) => {
                        if envelope.recipients.includes(sid)
                            && send_event(&mut ws_tx, &envelope.event).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%sid, lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    chat_service.disconnect(sid).await;
    tracing::debug!(%sid, "ws connection closed");
}

/// Serializes and writes one event.
async fn send_event(ws_tx: &mut WsSink, event: &ChatEvent) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!(event = event.event_name(), error = %err, "failed to encode event");
            return Ok(());
        }
    };
    ws_tx.send(Message::text(json)).await
}

/// Handles a text frame from the client, returning an optional event to
/// send back directly (malformed frames and reported errors).
async fn handle_text_message(
    text: &str,
    sid: SessionId,
    chat_service: &ChatService,
) -> Option<ChatEvent> {
    let command = match ClientCommand::from_frame(text) {
        Ok(command) => command,
        Err(err) => {
            tracing::debug!(%sid, error = %err, "malformed ws frame");
            return Some(ChatEvent::error(
                ChatError::InvalidRequest(err.to_string()).to_string(),
            ));
        }
    };

    let name = command.event_name();
    match dispatch(command, sid, chat_service).await {
        Ok(()) => None,
        Err(err) if err.is_reported() => {
            tracing::debug!(%sid, command = name, error = %err, "command failed");
            Some(ChatEvent::error(err.to_string()))
        }
        Err(err) => {
            tracing::debug!(%sid, command = name, error = %err, "command ignored");
            None
        }
    }
}

/// Routes a parsed command to the matching service operation.
async fn dispatch(
    command: ClientCommand,
    sid: SessionId,
    chat_service: &ChatService,
) -> Result<(), ChatError> {
    match command {
        ClientCommand::Message {
            data,
            kind,
            timestamp,
            room,
        } => {
            chat_service
                .post_message(sid, draft_from_parts(data, kind, timestamp, room))
                .await?;
        }
        ClientCommand::JoinPrivateChat { target_sid } => {
            chat_service
                .join_private_chat(sid, target_sid.as_deref().unwrap_or_default())
                .await?;
        }
        ClientCommand::JoinCommonRoom => chat_service.join_common_room(sid).await?,
        ClientCommand::LeavePrivateChat { room_name } => {
            chat_service.leave_private_chat(sid, &room_name).await?;
        }
        ClientCommand::SetNickname { nickname } => {
            chat_service.set_nickname(sid, &nickname).await?;
        }
        ClientCommand::EditMessage { id, data } => {
            chat_service.edit_message(sid, id, data).await?;
        }
        ClientCommand::DeleteMessage { id } => chat_service.delete_message(sid, id).await?,
        ClientCommand::GetChatHistory {
            room_name,
            limit,
            since_timestamp,
        } => {
            chat_service
                .request_history(
                    sid,
                    room_name.unwrap_or(RoomName::Common),
                    limit,
                    since_timestamp,
                )
                .await?;
        }
        ClientCommand::GetUserInfo => chat_service.request_user_info(sid).await,
        ClientCommand::GetChatStats => chat_service.request_stats(sid).await,
    }
    Ok(())
}
