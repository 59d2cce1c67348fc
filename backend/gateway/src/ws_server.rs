//! WebSocket entrypoint and connection handler.
//!
//! Each socket gets a connection id, a writer task draining its outbound
//! channel, and a reader task feeding decoded events to the matchmaker.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use neonchat_core::{ConnectionId, ServerEvent};

use crate::server::GatewayState;
use crate::session_registry::CLIENT_QUEUE_CAPACITY;
use crate::ws_protocol::{decode_client_event, encode_server_event};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: GatewayState) {
    let id = ConnectionId::new(Uuid::new_v4().to_string());
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(CLIENT_QUEUE_CAPACITY);

    // The sender must be reachable before the matchmaker announces the
    // connection, or the first online_count is lost.
    state.clients.register(id.clone(), tx);
    state.matchmaker.connect(id.clone()).await;
    info!(connection = %id, "WebSocket connection opened");

    let writer_id = id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match encode_server_event(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!(connection = %writer_id, error = %e, "Failed to encode outbound event");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let reader_state = state.clone();
    let reader_id = id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match decode_client_event(&text) {
                    Ok(event) => {
                        debug!(connection = %reader_id, event = event.name(), "Inbound event");
                        // Rejections are logged by the matchmaker; the socket stays open.
                        let _ = reader_state.matchmaker.handle(&reader_id, event).await;
                    }
                    Err(e) => {
                        warn!(connection = %reader_id, error = %e, "Rejected inbound frame");
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // If either task exits, abort the other. A reader can only be parked on
    // the matchmaker lock at that point, before any state has changed.
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    state.clients.unregister(&id);
    state.matchmaker.disconnect(&id).await;
    info!(connection = %id, "WebSocket connection closed");
}
