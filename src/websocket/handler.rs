use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config;
use crate::models::{ClientMessage, Identity, ServerMessage};
use crate::room::broadcaster::CONNECTION_BUFFER_SIZE;
use crate::room::{ConnId, IndicatorSet, RoomHandle};
use crate::services::auth_service::{get_auth_token, validate_jwt};
use crate::AppState;

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: Option<String>,
}

/// Board WebSocket handler
///
/// Browsers cannot set headers on a WebSocket handshake, so the token may
/// also arrive as a `?token=` query parameter or the auth cookie. The
/// identity derived from the verified claims is pinned to the connection;
/// identity fields inside client frames are ignored.
pub async fn board_ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsAuthQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let token = match query.token {
        Some(token) => Ok(token),
        None => get_auth_token(&headers),
    };
    let token = match token {
        Ok(token) => token,
        Err(e) => {
            info!("Rejected WebSocket connection without token: {}", e);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };
    let identity = match validate_jwt(&token, &config::get_config().jwt_secret) {
        Ok(token_data) => token_data.claims.identity(),
        Err(e) => {
            info!("Rejected WebSocket connection with invalid token: {}", e);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let room = state.room.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, identity, room))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, identity: Identity, room: RoomHandle) {
    // Generate unique connection ID to identify this client
    let conn_id: ConnId = Uuid::new_v4();

    info!(
        "WebSocket connection established for {} with connection_id: {}",
        identity.email, conn_id
    );

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Outbound frames for this connection; the room holds the producing
    // side once the client joins.
    let (out_tx, mut out_rx) = mpsc::channel::<String>(CONNECTION_BUFFER_SIZE);

    // Read client frames and feed them into the room as commands.
    let room_in = room.clone();
    let who = identity.email.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(Message::Text(msg))) = receiver.next().await {
            // Parse the incoming message as JSON
            let client_msg: ClientMessage = match serde_json::from_str(&msg) {
                Ok(client_msg) => client_msg,
                Err(e) => {
                    warn!("Failed to parse frame from connection {}: {}", conn_id, e);
                    continue;
                }
            };

            match client_msg {
                ClientMessage::Join { .. } => {
                    room_in.join(conn_id, identity.clone(), out_tx.clone());
                }
                ClientMessage::Leave {} => {
                    room_in.leave(conn_id);
                }
                ClientMessage::EditingStart { task_id } => {
                    room_in.raise(conn_id, IndicatorSet::Editing, task_id);
                }
                ClientMessage::EditingStop { task_id } => {
                    room_in.lower(conn_id, IndicatorSet::Editing, task_id);
                }
                ClientMessage::TypingStart { task_id } => {
                    room_in.raise(conn_id, IndicatorSet::Typing, task_id);
                }
                ClientMessage::TypingStop { task_id } => {
                    room_in.lower(conn_id, IndicatorSet::Typing, task_id);
                }
                ClientMessage::Ping {} => {
                    // Keepalive: answer this connection directly, the room
                    // is not involved.
                    let pong = ServerMessage::Pong {
                        date: Utc::now().to_rfc3339(),
                    };
                    match serde_json::to_string(&pong) {
                        Ok(text) => {
                            let _ = out_tx.try_send(text);
                        }
                        Err(e) => warn!("Failed to serialize pong: {}", e),
                    }
                }
            }
        }
    });

    // Pump room frames out to the client until either side goes away.
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut recv_task) => send_task.abort(),
        _ = (&mut send_task) => recv_task.abort(),
    };

    // The transport is gone, clean or abrupt: run the registry cleanup.
    // The leave command is idempotent, so an explicit leave beforehand is
    // fine.
    room.leave(conn_id);
    info!("WebSocket connection {} for {} terminated", conn_id, who);
}
