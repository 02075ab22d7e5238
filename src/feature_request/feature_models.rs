use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FeatureRequest {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub votes: i32,
    pub implemented: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFeatureRequest {
    #[validate(length(min = 1))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFeatureRequest {
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub votes: Option<i32>,
    pub implemented: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_votes_rejected() {
        let payload = UpdateFeatureRequest {
            description: None,
            votes: Some(-1),
            implemented: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_partial_update_is_valid() {
        let payload = UpdateFeatureRequest {
            description: None,
            votes: None,
            implemented: Some(true),
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_empty_description_rejected() {
        let payload = CreateFeatureRequest {
            description: String::new(),
        };
        assert!(payload.validate().is_err());
    }
}
