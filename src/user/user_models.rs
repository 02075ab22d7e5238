use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

/// Username derived from a Google profile when none is chosen by the user.
/// Falls back to the email local part.
pub fn username_from_profile(name: &str, email: &str) -> String {
    let candidate: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    if candidate.len() >= 3 {
        return candidate.to_lowercase();
    }

    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or("user")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_from_profile_strips_spaces() {
        assert_eq!(username_from_profile("Ada Lovelace", "ada@x.io"), "adalovelace");
    }

    #[test]
    fn test_username_from_profile_falls_back_to_email() {
        assert_eq!(username_from_profile("李", "li.wei@x.io"), "li.wei");
        assert_eq!(username_from_profile("", "@x.io"), "user");
    }

    #[test]
    fn test_user_response_drops_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: "ada".into(),
            email: "ada@x.io".into(),
            first_name: "Ada".into(),
            last_name: String::new(),
            password_hash: Some("secret".into()),
            google_id: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "ada");
    }
}
