use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::storage::media_url;

/// Room file row joined with the uploader's username.
#[derive(Debug, Clone, FromRow)]
pub struct RoomFile {
    pub id: Uuid,
    pub room_id: Uuid,
    pub name: String,
    pub path: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub uploaded_by: Uuid,
    pub uploader: String,
    pub is_staged: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomFileResponse {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub uploaded_by: String,
    pub is_staged: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl From<RoomFile> for RoomFileResponse {
    fn from(file: RoomFile) -> Self {
        Self {
            id: file.id,
            url: media_url(&file.path),
            name: file.name,
            content_type: file.content_type,
            size_bytes: file.size_bytes,
            uploaded_by: file.uploader,
            is_staged: file.is_staged,
            uploaded_at: file.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingDecision {
    Add,
    Remove,
}

impl StagingDecision {
    pub fn outcome(&self) -> &'static str {
        match self {
            StagingDecision::Add => "File added to room",
            StagingDecision::Remove => "File removed from staging area",
        }
    }
}

/// Only the uploader may decide on a staged file. That is checked before
/// the decision value, so a stranger gets 403 whatever they send.
pub fn decide(file: &RoomFile, requester: Uuid, decision: Option<&str>) -> Result<StagingDecision> {
    if file.uploaded_by != requester {
        return Err(AppError::Forbidden(
            "Only the uploader can make decisions on staged files".to_string(),
        ));
    }

    match decision {
        Some("add") => Ok(StagingDecision::Add),
        Some("remove") => Ok(StagingDecision::Remove),
        _ => Err(AppError::BadRequest("Invalid decision".to_string())),
    }
}
