//! WebSocket connection handler and HTTP endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::common::time::timestamp_to_rfc3339;

use super::protocol::ClientEvent;
use super::registry::ConnectionId;
use super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::new();

    // Channel through which the matchmaker pushes events to this client.
    let (tx, mut rx) = mpsc::unbounded_channel();
    {
        let mut matchmaker = state.matchmaker.lock().await;
        matchmaker.connect(connection_id, tx);
    }

    let (mut sender, mut receiver) = socket.split();

    // Receive events from this client and dispatch them to the matchmaker.
    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(%connection_id, "WebSocket error: {e}");
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // Malformed payloads are rejected here; the core only
                    // ever sees validated events.
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(%connection_id, "ignoring malformed event: {e}");
                            continue;
                        }
                    };
                    dispatch(&recv_state, connection_id, event).await;
                }
                Message::Close(_) => {
                    tracing::debug!(%connection_id, "client requested close");
                    break;
                }
                // Ping/pong is handled by the WebSocket layer.
                _ => {}
            }
        }
    });

    // Forward matchmaker events to this client's socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(%connection_id, "failed to serialize event: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // If either task finishes the connection is done; abort the other.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Single cleanup point for the transport-close path.
    let mut matchmaker = state.matchmaker.lock().await;
    matchmaker.disconnect(connection_id);
}

async fn dispatch(state: &Arc<AppState>, connection_id: ConnectionId, event: ClientEvent) {
    let mut matchmaker = state.matchmaker.lock().await;
    match event {
        ClientEvent::FindPartner { interests } => {
            matchmaker.find_partner(connection_id, &interests);
        }
        ClientEvent::CancelSearch => matchmaker.cancel_search(connection_id),
        ClientEvent::Signal { payload } => matchmaker.relay_signal(connection_id, payload),
        ClientEvent::SendMessage { message } => matchmaker.relay_message(connection_id, message),
        ClientEvent::ManualDisconnect => matchmaker.leave_room(connection_id),
    }
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current matchmaking counts, for monitoring.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = {
        let matchmaker = state.matchmaker.lock().await;
        matchmaker.stats()
    };

    Json(serde_json::json!({
        "connected": stats.connected,
        "waiting": stats.waiting,
        "rooms": stats.rooms,
        "startedAt": timestamp_to_rfc3339(state.started_at),
    }))
}
