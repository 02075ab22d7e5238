use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Done,
    Undone,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Undone => write!(f, "undone"),
        }
    }
}

/// Task row joined with the usernames the API exposes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub room_id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub assigned_to_id: Uuid,
    pub assigned_to: String,
    pub created_by_id: Uuid,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const ASSIGNEE_RULE: &str =
    "The assigned user must be a member of the room or the room creator.";

/// An assignee has to belong to the room. The creator always qualifies, even
/// for rooms whose creator row predates automatic membership.
pub fn ensure_valid_assignee(
    room_created_by: Option<Uuid>,
    assignee: Uuid,
    assignee_is_member: bool,
) -> Result<()> {
    if assignee_is_member || room_created_by == Some(assignee) {
        Ok(())
    } else {
        Err(AppError::field("assigned_to", ASSIGNEE_RULE))
    }
}

pub fn task_notification_text(task_title: &str, room_name: &str) -> String {
    format!("Task '{}' assigned to you in room '{}'", task_title, room_name)
}

pub fn comment_notification_text(task_title: &str, room_name: &str) -> String {
    format!(
        "New comment added to task '{}' in room '{}'",
        task_title, room_name
    )
}
