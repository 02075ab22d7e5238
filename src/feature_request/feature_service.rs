use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::room::room_service::RoomService;
use super::feature_models::{FeatureRequest, UpdateFeatureRequest};
use super::feature_repository::FeatureRequestRepository;

/// Feature requests are private to their author within a room.
#[derive(Clone)]
pub struct FeatureRequestService {
    repo: FeatureRequestRepository,
    rooms: RoomService,
}

fn not_found() -> AppError {
    AppError::NotFound("Feature request not found".to_string())
}

impl FeatureRequestService {
    pub fn new(repo: FeatureRequestRepository, rooms: RoomService) -> Self {
        Self { repo, rooms }
    }

    pub async fn list(&self, room_id: Uuid, user_id: Uuid) -> Result<Vec<FeatureRequest>> {
        self.repo.find_by_owner(room_id, user_id).await
    }

    pub async fn create(&self, room_id: Uuid, user_id: Uuid, description: &str) -> Result<FeatureRequest> {
        let room = self.rooms.readable_room_by_id(room_id, user_id).await?;
        let request = self.repo.create(room.id, user_id, description).await?;
        tracing::info!("Feature request {} created in room {}", request.id, room.slug);
        Ok(request)
    }

    pub async fn get(&self, room_id: Uuid, id: Uuid, user_id: Uuid) -> Result<FeatureRequest> {
        self.repo
            .find_by_id(id, room_id, user_id)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn update(
        &self,
        room_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        changes: &UpdateFeatureRequest,
    ) -> Result<FeatureRequest> {
        self.repo
            .update(id, room_id, user_id, changes)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, room_id: Uuid, id: Uuid, user_id: Uuid) -> Result<()> {
        if self.repo.delete(id, room_id, user_id).await? == 0 {
            return Err(not_found());
        }
        Ok(())
    }
}
