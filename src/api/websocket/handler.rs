//! WebSocket connection handler
//!
//! A connection joins a room either straight from the `?room=&user=` query
//! or with its first valid `join_room` message. From then on it forwards its
//! session's relay stream to the socket and feeds inbound events to the
//! session manager.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;

use super::state::AppState;
use crate::error::SyncError;
use crate::protocol::{ClientEvent, ServerEvent, WsMessage};
use crate::session::SessionHandle;

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Room to join on connect
    pub room: Option<String>,
    /// Username to join as
    pub user: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, params: WsParams) {
    let joined = match (params.room, params.user) {
        (Some(room), Some(user)) => match state.sessions.join(&room, &user) {
            Ok(handle) => Some(handle),
            Err(e) => {
                if !send_error(&mut socket, &e).await {
                    return;
                }
                None
            }
        },
        _ => None,
    };

    let handle = match joined {
        Some(handle) => handle,
        None => match await_join(&mut socket, &state).await {
            Some(handle) => handle,
            None => return, // Closed before joining
        },
    };

    let session_id = handle.session_id().to_string();
    run_session(&mut socket, &state, handle).await;
    state.sessions.leave(&session_id);
}

/// Wait for a valid `join_room`
///
/// Anything else is answered with `connection_error` (or `pong`) and the
/// connection keeps waiting. Returns `None` if the client goes away first.
async fn await_join(socket: &mut WebSocket, state: &AppState) -> Option<SessionHandle> {
    while let Some(result) = socket.recv().await {
        let text = match result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data)).await;
                continue;
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        };

        let error = match serde_json::from_str::<ClientEvent>(&text) {
            Ok(ClientEvent::JoinRoom { room_id, username }) => {
                match state.sessions.join(&room_id, &username) {
                    Ok(handle) => return Some(handle),
                    Err(e) => e,
                }
            }
            Ok(ClientEvent::Ping) => {
                if !send_message(socket, &WsMessage::new(ServerEvent::Pong, 0)).await {
                    return None;
                }
                continue;
            }
            Ok(_) => SyncError::NotJoined("connection has not joined a room".to_string()),
            Err(e) => SyncError::MalformedEvent(e.to_string()),
        };

        if !send_error(socket, &error).await {
            return None;
        }
    }
    None
}

/// Pump a joined session until either side ends it
async fn run_session(socket: &mut WebSocket, state: &AppState, handle: SessionHandle) {
    let SessionHandle {
        info,
        snapshot,
        mut events,
    } = handle;

    // Snapshot first, then everything after it
    if !send_message(socket, &snapshot).await {
        return;
    }

    loop {
        tokio::select! {
            // Relay stream to client
            outbound = events.recv() => {
                match outbound {
                    Some(msg) => {
                        if !send_message(socket, &msg).await {
                            break; // Client disconnected
                        }
                    }
                    None => break, // Session no longer in the room
                }
            }

            // Handle client messages
            result = socket.recv() => {
                let text = match result {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue, // Ignore binary and pong frames
                };

                let replies = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => state.sessions.respond(&info.session_id, &mut events, event),
                    Err(e) => vec![error_message(&SyncError::MalformedEvent(e.to_string()))],
                };

                for msg in &replies {
                    if !send_message(socket, msg).await {
                        return;
                    }
                }
            }
        }
    }
}

fn error_message(error: &SyncError) -> WsMessage {
    WsMessage::new(ServerEvent::connection_error(error.to_string()), 0)
}

async fn send_error(socket: &mut WebSocket, error: &SyncError) -> bool {
    tracing::debug!(code = error.code(), error = %error, "Sending connection error");
    send_message(socket, &error_message(error)).await
}

/// Serialize and send; returns false once the client is gone
async fn send_message(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            true
        }
    }
}
