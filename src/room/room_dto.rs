use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// Body of `POST /room`. The `action` field selects the operation.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RoomAction {
    Create {
        room_name: Option<String>,
        description: Option<String>,
        #[serde(default)]
        is_private: bool,
    },
    Join {
        room_slug: String,
    },
    RemoveUser {
        room_slug: String,
        username: String,
    },
    MakeAdmin {
        room_slug: String,
        username: String,
    },
    Delete {
        room_slug: String,
    },
}

const ACTIONS: [&str; 5] = ["create", "join", "remove_user", "make_admin", "delete"];

impl RoomAction {
    pub fn from_value(value: Value) -> Result<Self> {
        let known = value
            .get("action")
            .and_then(Value::as_str)
            .is_some_and(|action| ACTIONS.contains(&action));

        if !known {
            return Err(AppError::Validation("Invalid action.".to_string()));
        }

        serde_json::from_value(value).map_err(|e| AppError::Validation(e.to_string()))
    }
}

/// Schema-only mirror of [`RoomAction`] for the API docs.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RoomActionRequest {
    /// One of `create`, `join`, `remove_user`, `make_admin`, `delete`.
    pub action: String,
    pub room_name: Option<String>,
    pub description: Option<String>,
    pub is_private: Option<bool>,
    pub room_slug: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub message: String,
    pub liked: bool,
}
