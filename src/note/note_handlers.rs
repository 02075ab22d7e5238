use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    middleware::AuthUser,
    state::AppState,
};
use super::note_models::{NoteRequest, UserNote};

fn note_not_found() -> AppError {
    AppError::NotFound("Note not found".to_string())
}

/// List the caller's notes, most recently saved first
#[utoipa::path(
    get,
    path = "/api/user/notes",
    responses((status = 200, description = "Notes", body = Vec<UserNote>)),
    tag = "notes",
    security(("bearer_auth" = []))
)]
pub async fn list_notes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<UserNote>>> {
    let notes = state.note_repository.find_by_user(user_id).await?;
    Ok(Json(notes))
}

/// Create a note
#[utoipa::path(
    post,
    path = "/api/user/notes",
    request_body = NoteRequest,
    responses(
        (status = 201, description = "Note created", body = UserNote),
        (status = 400, description = "Invalid payload")
    ),
    tag = "notes",
    security(("bearer_auth" = []))
)]
pub async fn create_note(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<NoteRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let note = state
        .note_repository
        .create(user_id, &payload.title, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Get one of the caller's notes
#[utoipa::path(
    get,
    path = "/api/user/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note", body = UserNote),
        (status = 404, description = "Note not found")
    ),
    tag = "notes",
    security(("bearer_auth" = []))
)]
pub async fn get_note(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<Json<UserNote>> {
    let note = state
        .note_repository
        .find_by_id(note_id, user_id)
        .await?
        .ok_or_else(note_not_found)?;
    Ok(Json(note))
}

/// Replace a note's title and content
#[utoipa::path(
    put,
    path = "/api/user/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "Note saved", body = UserNote),
        (status = 404, description = "Note not found")
    ),
    tag = "notes",
    security(("bearer_auth" = []))
)]
pub async fn update_note(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(note_id): Path<Uuid>,
    Json(payload): Json<NoteRequest>,
) -> Result<Json<UserNote>> {
    payload.validate()?;

    let note = state
        .note_repository
        .update(note_id, user_id, &payload.title, &payload.content)
        .await?
        .ok_or_else(note_not_found)?;
    Ok(Json(note))
}

/// Delete a note
#[utoipa::path(
    delete,
    path = "/api/user/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 404, description = "Note not found")
    ),
    tag = "notes",
    security(("bearer_auth" = []))
)]
pub async fn delete_note(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.note_repository.delete(note_id, user_id).await? == 0 {
        return Err(note_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
