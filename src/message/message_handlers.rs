use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::Result,
    message::message_dto::MessagesResponse,
    middleware::AuthUser,
    state::AppState,
};

/// Send a message to a room
#[utoipa::path(
    post,
    path = "/api/room/{slug}/messages",
    tag = "messages",
    params(("slug" = String, Path, description = "Room slug")),
    request_body(content = crate::message::message_dto::SendMessageForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Message sent successfully", body = crate::message::message_models::RoomMessage),
        (status = 400, description = "Neither text nor media"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member of the room"),
        (status = 404, description = "Room not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let message = state.message_service.send(&slug, user_id, multipart).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Room history, oldest first
#[utoipa::path(
    get,
    path = "/api/room/{slug}/messages",
    tag = "messages",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 200, description = "Messages", body = MessagesResponse),
        (status = 403, description = "Private room"),
        (status = 404, description = "Room not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<MessagesResponse>> {
    let messages = state.message_service.list(&slug, user_id).await?;
    Ok(Json(MessagesResponse { messages }))
}
