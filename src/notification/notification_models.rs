use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    /// Username of the sender.
    pub sender: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Email subjects used for the two notification kinds.
pub const TASK_SUBJECT: &str = "New Task Assignment";
pub const COMMENT_SUBJECT: &str = "New Comment on Task";

/// Email body wrapping a notification message.
pub fn email_body(message: &str, signature: &str) -> String {
    format!("Hello,\n\n{}\n\nRegards,\n{}", message, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_body_layout() {
        assert_eq!(
            email_body("Task 'A' assigned to you in room 'B'", "team@coloby.com"),
            "Hello,\n\nTask 'A' assigned to you in room 'B'\n\nRegards,\nteam@coloby.com"
        );
    }
}
