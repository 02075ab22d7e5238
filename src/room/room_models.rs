use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Length of the random part appended to a room name before slugging.
pub const SLUG_SUFFIX_LEN: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Room {
    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.created_by == Some(user_id)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RoomMember {
    pub user_id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub created_by: Option<String>,
    pub users: Vec<String>,
    pub admins: Vec<String>,
    pub total_users: usize,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

impl RoomResponse {
    pub fn build(
        room: Room,
        creator: Option<String>,
        members: Vec<RoomMember>,
        likes: i64,
    ) -> Self {
        let admins = members
            .iter()
            .filter(|m| m.is_admin)
            .map(|m| m.username.clone())
            .collect();
        let users: Vec<String> = members.into_iter().map(|m| m.username).collect();

        Self {
            id: room.id,
            name: room.name,
            slug: room.slug,
            description: room.description,
            is_private: room.is_private,
            created_by: creator,
            total_users: users.len(),
            users,
            admins,
            likes,
            created_at: room.created_at,
        }
    }
}

/// Folds accents away (NFKD) and drops whatever is still not ASCII, then
/// lowercases, keeps only alphanumerics, `_`, `-` and whitespace, folds
/// whitespace/hyphen runs into one `-` and trims `-`/`_` from both ends.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.nfkd().filter(char::is_ascii) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

pub fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_SUFFIX_LEN)
        .map(char::from)
        .collect()
}

pub fn room_slug(name: &str, suffix: &str) -> String {
    slugify(&format!("{}_{}", name, suffix))
}

/// Joining is open for public rooms. Private rooms only accept people who
/// are already members, which makes a repeated join a no-op.
pub fn ensure_can_join(room: &Room, already_member: bool) -> Result<()> {
    if room.is_private && !already_member {
        return Err(AppError::Forbidden(
            "Access denied, this is a private room!".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_can_read(room: &Room, is_member: bool) -> Result<()> {
    if room.is_private && !is_member {
        return Err(AppError::Forbidden(
            "You do not have access to this room.".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_member(is_member: bool) -> Result<()> {
    if !is_member {
        return Err(AppError::Forbidden(
            "You must be a member of this room.".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_creator(room: &Room, requester: Uuid, message: &str) -> Result<()> {
    if !room.is_creator(requester) {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_room(is_private: bool, created_by: Option<Uuid>) -> Room {
    Room {
        id: Uuid::new_v4(),
        name: "Demo".into(),
        slug: "demo_ab12".into(),
        description: None,
        is_private,
        created_by,
        created_at: Utc::now(),
        deleted_at: None,
    }
}
