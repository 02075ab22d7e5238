use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;
use super::feature_models::{FeatureRequest, UpdateFeatureRequest};

#[derive(Clone)]
pub struct FeatureRequestRepository {
    pool: PgPool,
}

impl FeatureRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, room_id: Uuid, user_id: Uuid, description: &str) -> Result<FeatureRequest> {
        let request = sqlx::query_as::<_, FeatureRequest>(
            "INSERT INTO feature_requests (room_id, user_id, description)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(room_id)
        .bind(user_id)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn find_by_owner(&self, room_id: Uuid, user_id: Uuid) -> Result<Vec<FeatureRequest>> {
        let requests = sqlx::query_as::<_, FeatureRequest>(
            "SELECT * FROM feature_requests
             WHERE room_id = $1 AND user_id = $2
             ORDER BY created_at",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    pub async fn find_by_id(&self, id: Uuid, room_id: Uuid, user_id: Uuid) -> Result<Option<FeatureRequest>> {
        let request = sqlx::query_as::<_, FeatureRequest>(
            "SELECT * FROM feature_requests WHERE id = $1 AND room_id = $2 AND user_id = $3",
        )
        .bind(id)
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn update(
        &self,
        id: Uuid,
        room_id: Uuid,
        user_id: Uuid,
        changes: &UpdateFeatureRequest,
    ) -> Result<Option<FeatureRequest>> {
        let request = sqlx::query_as::<_, FeatureRequest>(
            "UPDATE feature_requests
             SET description = COALESCE($4, description),
                 votes = COALESCE($5, votes),
                 implemented = COALESCE($6, implemented)
             WHERE id = $1 AND room_id = $2 AND user_id = $3
             RETURNING *",
        )
        .bind(id)
        .bind(room_id)
        .bind(user_id)
        .bind(changes.description.as_deref())
        .bind(changes.votes)
        .bind(changes.implemented)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn delete(&self, id: Uuid, room_id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM feature_requests WHERE id = $1 AND room_id = $2 AND user_id = $3",
        )
        .bind(id)
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
