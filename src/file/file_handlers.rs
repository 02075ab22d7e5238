use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Multipart, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::Result, middleware::AuthUser, state::AppState};
use super::file_models::RoomFileResponse;

/// Multipart form accepted by the upload endpoint. Documentation only.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Display name; defaults to the uploaded file name
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionRequest {
    /// `add` or `remove`
    pub decision: Option<String>,
}

/// Upload a file into the room's staging area
#[utoipa::path(
    post,
    path = "/api/room/{slug}/upload",
    params(("slug" = String, Path, description = "Room slug")),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File staged", body = RoomFileResponse),
        (status = 400, description = "No file submitted"),
        (status = 403, description = "Not a member of the room"),
        (status = 404, description = "Room not found")
    ),
    tag = "files",
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let file = state.file_service.upload(&slug, user_id, multipart).await?;
    Ok((StatusCode::CREATED, Json(file)))
}

/// Add a staged file to the room or discard it
#[utoipa::path(
    post,
    path = "/api/room/{slug}/stage/{id}/decision",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("id" = Uuid, Path, description = "Staged file ID")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision applied", body = String),
        (status = 400, description = "Invalid decision"),
        (status = 403, description = "Only the uploader can decide"),
        (status = 404, description = "Staged file not found")
    ),
    tag = "files",
    security(("bearer_auth" = []))
)]
pub async fn staging_decision(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((slug, file_id)): Path<(String, Uuid)>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<&'static str>> {
    let outcome = state
        .file_service
        .decide(&slug, file_id, user_id, payload.decision.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// Files waiting for a decision
#[utoipa::path(
    get,
    path = "/api/room/{slug}/staged",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 200, description = "Staged files", body = Vec<RoomFileResponse>),
        (status = 403, description = "Private room"),
        (status = 404, description = "Room not found")
    ),
    tag = "files",
    security(("bearer_auth" = []))
)]
pub async fn staged_files(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<Vec<RoomFileResponse>>> {
    let files = state.file_service.list(&slug, user_id, true).await?;
    Ok(Json(files))
}

/// Files added to the room
#[utoipa::path(
    get,
    path = "/api/room/{slug}/room-files",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 200, description = "Room files", body = Vec<RoomFileResponse>),
        (status = 403, description = "Private room"),
        (status = 404, description = "Room not found")
    ),
    tag = "files",
    security(("bearer_auth" = []))
)]
pub async fn room_files(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<Vec<RoomFileResponse>>> {
    let files = state.file_service.list(&slug, user_id, false).await?;
    Ok(Json(files))
}

/// Download a stored room file or chat attachment
#[utoipa::path(
    get,
    path = "/media/{path}",
    params(("path" = String, Path, description = "Stored path, as returned in file and message URLs")),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Private room"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(("bearer_auth" = []))
)]
pub async fn serve_media(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response> {
    let file = state.file_service.readable_media(&path, user_id).await?;
    let response = ServeFile::new(file)
        .oneshot(request)
        .await
        .unwrap_or_else(|never: Infallible| match never {});
    Ok(response.map(Body::new))
}
