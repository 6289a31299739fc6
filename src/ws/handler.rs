//! WebSocket handler for client connections.

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::AppState;

use super::hub::ChatHub;
use super::types::{resolve_display_name, Inbound, Message};

/// Query parameters for the connect request.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// Display name; absent or blank falls back to a pseudonymous one.
    pub username: Option<String>,
}

/// WebSocket upgrade handler.
///
/// GET /ws
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let username = resolve_display_name(params.username.as_deref());
    debug!("WebSocket upgrade request from {}", username);

    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub, username))
}

/// Run one client session until its stream fails or closes.
async fn handle_socket(socket: WebSocket, hub: Arc<ChatHub>, username: String) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut outbound_rx) = hub.register(&username);
    info!("New client connected: {}", username);

    // Writer task: drains the fan-out channel onto the socket. A write
    // error ends the task, which drops the receiver; the hub notices on
    // the next fan-out.
    let writer_name = username.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(e) => {
                    warn!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if let Err(e) = sender.send(WsMessage::Text(json.into())).await {
                warn!("Write error for {}: {}", writer_name, e);
                break;
            }
        }
    });

    // The welcome goes to this client alone, then the room hears about it.
    // Both ride the same outbound channel, so the client sees them in that
    // order.
    let welcome = Message::system(format!("Welcome, {}! You are now connected.", username));
    if !hub.send_to(conn_id, welcome).await {
        warn!("Failed to queue welcome message for {}", username);
        // Never became visible to the room, so no leave notice.
        hub.unregister(conn_id);
        send_task.abort();
        return;
    }

    hub.publish(Message::system(format!("{} has joined the chat", username)));

    // Read loop: stamp inbound messages and hand them to the hub.
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match serde_json::from_str::<Inbound>(&text) {
                Ok(inbound) => {
                    hub.publish(Message::user(&username, inbound.content));
                }
                Err(e) => {
                    // A payload that fails to parse terminates the session.
                    warn!("Malformed message from {}: {}", username, e);
                    break;
                }
            },
            Ok(WsMessage::Binary(_)) => {
                debug!("Ignoring binary frame from {}", username);
            }
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {}
            Ok(WsMessage::Close(_)) => {
                info!("{} closed the connection", username);
                break;
            }
            Err(e) => {
                warn!("Read error for {}: {}", username, e);
                break;
            }
        }
    }

    send_task.abort();

    // Whichever path removes the registry entry first owns the leave
    // notice; everyone else sees None here.
    if let Some(name) = hub.unregister(conn_id) {
        hub.publish(Message::system(format!("{} has left the chat", name)));
    }
    info!("Client disconnected: {}", username);
}
