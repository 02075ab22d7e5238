use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::storage::media_url;

/// Chat message row joined with the author's username.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub user: String,
    pub message: Option<String>,
    pub media_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomMessage {
    pub id: Uuid,
    /// Author username
    pub user: String,
    pub message: Option<String>,
    /// URL of the attachment, if any
    pub media: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for RoomMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            user: message.user,
            message: message.message,
            media: message.media_path.as_deref().map(media_url),
            created_at: message.created_at,
        }
    }
}

/// Blank text counts as no text.
pub fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

pub fn ensure_has_content(text: Option<&str>, has_media: bool) -> Result<()> {
    if text.is_none() && !has_media {
        return Err(AppError::field(
            "message",
            "A message needs either text or a media attachment.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_dropped() {
        assert_eq!(normalize_text(Some("   ".into())), None);
        assert_eq!(normalize_text(None), None);
        assert_eq!(normalize_text(Some(" hi \n".into())), Some("hi".to_string()));
    }

    #[test]
    fn test_message_needs_text_or_media() {
        assert!(ensure_has_content(Some("hello"), false).is_ok());
        assert!(ensure_has_content(None, true).is_ok());
        assert!(matches!(
            ensure_has_content(None, false),
            Err(AppError::FieldValidation { .. })
        ));
    }

    #[test]
    fn test_response_resolves_media_url() {
        let message = Message {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user: "bob".into(),
            message: None,
            media_path: Some("media/1234_photo.png".into()),
            created_at: Utc::now(),
        };
        let response = RoomMessage::from(message);
        assert_eq!(response.media.as_deref(), Some("/media/media/1234_photo.png"));
        assert_eq!(response.user, "bob");
    }
}
