use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::room::room_models::RoomResponse;
use crate::task::task_models::Task;

use super::user_models::UserResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 150))]
    pub username: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
}

/// Everything the frontend needs on first load.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDashboard {
    pub user: UserResponse,
    pub joined_rooms: Vec<RoomResponse>,
    pub created_rooms: Vec<RoomResponse>,
    pub assigned_tasks: Vec<Task>,
}
