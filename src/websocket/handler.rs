use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    middleware::AuthUser,
    room::room_models::{ensure_member, Room},
    state::AppState,
    websocket::types::{ClientMessage, ErrorPayload, PresencePayload, WsMessage},
};

use super::connection::WsSender;

/// Room chat socket. Only members may connect.
#[utoipa::path(
    get,
    path = "/api/ws/room/{slug}",
    tag = "messages",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 101, description = "Switching protocols"),
        (status = 403, description = "Not a member of the room"),
        (status = 404, description = "Room not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
) -> Result<Response> {
    let room = state.room_service.find_room(&slug).await?;
    ensure_member(state.room_service.is_member(&room, user_id).await?)?;
    let username = state
        .user_repository
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?
        .username;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, room, user_id, username, state)))
}

async fn handle_socket(socket: WebSocket, room: Room, user_id: Uuid, username: String, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let connections = state.ws_connections.clone();
    let connection_id = connections.join(room.id, user_id, tx.clone());
    connections.broadcast_to_room(room.id, presence(user_id, &username, true));

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    let recv_room = room.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Err(e) = process_client_message(&text, &recv_room, user_id, &state).await {
                        tracing::warn!("Rejected WebSocket frame from {}: {}", user_id, e);
                        send_error(&tx, e.to_string());
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    connections.leave(room.id, connection_id);
    if !connections.is_user_online(room.id, user_id) {
        connections.broadcast_to_room(room.id, presence(user_id, &username, false));
    }

    tracing::info!("WebSocket connection closed for user {} in room {}", user_id, room.slug);
}

async fn process_client_message(text: &str, room: &Room, user_id: Uuid, state: &AppState) -> Result<()> {
    let client_msg: ClientMessage = serde_json::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("Invalid message format: {}", e)))?;

    match client_msg {
        // Fan-out to the room, sender included, happens in the service.
        ClientMessage::SendMessage { message } => {
            state.message_service.send_text(room, user_id, message).await?;
        }
    }

    Ok(())
}

fn presence(user_id: Uuid, username: &str, is_online: bool) -> WsMessage {
    WsMessage::Presence(PresencePayload {
        user_id,
        username: username.to_string(),
        is_online,
    })
}

fn send_error(tx: &WsSender, message: String) {
    let _ = tx.send(WsMessage::Error(ErrorPayload { message }));
}
