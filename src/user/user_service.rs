use crate::{
    error::{is_unique_violation, AppError, Result},
    room::room_service::RoomService,
    task::task_service::TaskService,
    user::{
        user_dto::{UpdateProfileRequest, UserDashboard},
        user_models::UserResponse,
        user_repository::UserRepository,
    },
};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
    room_service: RoomService,
    task_service: TaskService,
}

impl UserService {
    pub fn new(
        user_repository: UserRepository,
        room_service: RoomService,
        task_service: TaskService,
    ) -> Self {
        Self {
            user_repository,
            room_service,
            task_service,
        }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserResponse> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        payload: UpdateProfileRequest,
    ) -> Result<UserResponse> {
        let user = self
            .user_repository
            .update_profile(
                user_id,
                payload.username.as_deref(),
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e, Some("users_username_key")) {
                    AppError::field("username", "Username already taken.")
                } else {
                    e
                }
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(UserResponse::from(user))
    }

    pub async fn dashboard(&self, user_id: Uuid) -> Result<UserDashboard> {
        let user = self.get_profile(user_id).await?;
        let (joined_rooms, created_rooms) = self.room_service.rooms_for_user(user_id).await?;
        let assigned_tasks = self.task_service.tasks_assigned_to(user_id).await?;

        Ok(UserDashboard {
            user,
            joined_rooms,
            created_rooms,
            assigned_tasks,
        })
    }
}
