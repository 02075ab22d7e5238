use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{error::Result, middleware::AuthUser, state::AppState};
use super::feature_models::{CreateFeatureRequest, FeatureRequest, UpdateFeatureRequest};

/// The caller's feature requests in a room
#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}/feature-requests",
    params(("room_id" = Uuid, Path, description = "Room ID")),
    responses((status = 200, description = "Feature requests", body = Vec<FeatureRequest>)),
    tag = "feature-requests",
    security(("bearer_auth" = []))
)]
pub async fn list_feature_requests(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<FeatureRequest>>> {
    let requests = state.feature_request_service.list(room_id, user_id).await?;
    Ok(Json(requests))
}

/// Request a feature in a room
#[utoipa::path(
    post,
    path = "/api/rooms/{room_id}/feature-requests",
    params(("room_id" = Uuid, Path, description = "Room ID")),
    request_body = CreateFeatureRequest,
    responses(
        (status = 201, description = "Feature request created", body = FeatureRequest),
        (status = 403, description = "Private room"),
        (status = 404, description = "Room not found")
    ),
    tag = "feature-requests",
    security(("bearer_auth" = []))
)]
pub async fn create_feature_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<CreateFeatureRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let request = state
        .feature_request_service
        .create(room_id, user_id, &payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}/feature-requests/{id}",
    params(
        ("room_id" = Uuid, Path, description = "Room ID"),
        ("id" = Uuid, Path, description = "Feature request ID")
    ),
    responses(
        (status = 200, description = "Feature request", body = FeatureRequest),
        (status = 404, description = "Feature request not found")
    ),
    tag = "feature-requests",
    security(("bearer_auth" = []))
)]
pub async fn get_feature_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((room_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<FeatureRequest>> {
    let request = state.feature_request_service.get(room_id, id, user_id).await?;
    Ok(Json(request))
}

#[utoipa::path(
    put,
    path = "/api/rooms/{room_id}/feature-requests/{id}",
    params(
        ("room_id" = Uuid, Path, description = "Room ID"),
        ("id" = Uuid, Path, description = "Feature request ID")
    ),
    request_body = UpdateFeatureRequest,
    responses(
        (status = 200, description = "Feature request updated", body = FeatureRequest),
        (status = 404, description = "Feature request not found")
    ),
    tag = "feature-requests",
    security(("bearer_auth" = []))
)]
pub async fn update_feature_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((room_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateFeatureRequest>,
) -> Result<Json<FeatureRequest>> {
    payload.validate()?;

    let request = state
        .feature_request_service
        .update(room_id, id, user_id, &payload)
        .await?;
    Ok(Json(request))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{room_id}/feature-requests/{id}",
    params(
        ("room_id" = Uuid, Path, description = "Room ID"),
        ("id" = Uuid, Path, description = "Feature request ID")
    ),
    responses(
        (status = 204, description = "Feature request deleted"),
        (status = 404, description = "Feature request not found")
    ),
    tag = "feature-requests",
    security(("bearer_auth" = []))
)]
pub async fn delete_feature_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((room_id, id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    state.feature_request_service.delete(room_id, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
