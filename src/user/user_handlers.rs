use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::Result,
    middleware::AuthUser,
    state::AppState,
    user::{
        user_dto::{UpdateProfileRequest, UserDashboard},
        user_models::UserResponse,
    },
};

/// Get current user profile
#[utoipa::path(
    get,
    path = "/api/user-profile",
    tag = "users",
    responses(
        (status = 200, description = "User profile retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>> {
    let user = state.user_service.get_profile(user_id).await?;
    Ok(Json(user))
}

/// Update current user profile
#[utoipa::path(
    put,
    path = "/api/user-profile",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = UserResponse),
        (status = 400, description = "Invalid input or username taken"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    payload.validate()?;

    let user = state.user_service.update_profile(user_id, payload).await?;
    Ok(Json(user))
}

/// User, joined rooms, created rooms and assigned tasks
#[utoipa::path(
    get,
    path = "/api/userdata",
    tag = "users",
    responses(
        (status = 200, description = "Dashboard data", body = UserDashboard),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn user_data(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserDashboard>> {
    let dashboard = state.user_service.dashboard(user_id).await?;
    Ok(Json(dashboard))
}
