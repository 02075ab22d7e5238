use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::{
    error::Result,
    middleware::AuthUser,
    state::AppState,
};
use super::{
    room_dto::{DetailResponse, LikeResponse, RoomAction},
    room_models::RoomResponse,
};

/// Create, join, remove a member, promote an admin or delete a room
#[utoipa::path(
    post,
    path = "/api/room",
    tag = "rooms",
    request_body = crate::room::room_dto::RoomActionRequest,
    responses(
        (status = 201, description = "Room created", body = RoomResponse),
        (status = 200, description = "Action applied", body = DetailResponse),
        (status = 400, description = "Invalid action or payload"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Room or user not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn room_action(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<Value>,
) -> Result<Response> {
    let response = match RoomAction::from_value(body)? {
        RoomAction::Create {
            room_name,
            description,
            is_private,
        } => {
            let room = state
                .room_service
                .create_room(user_id, room_name.as_deref(), description.as_deref(), is_private)
                .await?;
            (StatusCode::CREATED, Json(room)).into_response()
        }
        RoomAction::Join { room_slug } => {
            state.room_service.join_room(&room_slug, user_id).await?;
            Json(DetailResponse::new("Successfully joined the room.")).into_response()
        }
        RoomAction::RemoveUser {
            room_slug,
            username,
        } => {
            let detail = state
                .room_service
                .remove_user(&room_slug, &username, user_id)
                .await?;
            Json(DetailResponse::new(detail)).into_response()
        }
        RoomAction::MakeAdmin {
            room_slug,
            username,
        } => {
            let detail = state
                .room_service
                .make_admin(&room_slug, &username, user_id)
                .await?;
            Json(DetailResponse::new(detail)).into_response()
        }
        RoomAction::Delete { room_slug } => {
            state.room_service.delete_room(&room_slug, user_id).await?;
            Json(DetailResponse::new("Room deleted successfully.")).into_response()
        }
    };

    Ok(response)
}

/// Get a room by slug
#[utoipa::path(
    get,
    path = "/api/room/{slug}",
    tag = "rooms",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 200, description = "Room details", body = RoomResponse),
        (status = 403, description = "Private room"),
        (status = 404, description = "Room not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn room_detail(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<RoomResponse>> {
    let room = state.room_service.room_detail(&slug, user_id).await?;
    Ok(Json(room))
}

/// Like or unlike a room
#[utoipa::path(
    post,
    path = "/api/room/like/{slug}",
    tag = "rooms",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Room not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn like_room(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<LikeResponse>> {
    let liked = state.room_service.toggle_like(&slug, user_id).await?;
    let message = if liked {
        "Room liked successfully."
    } else {
        "Room unliked successfully."
    };

    Ok(Json(LikeResponse {
        message: message.to_string(),
        liked,
    }))
}
