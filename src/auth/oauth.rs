use oauth2::{basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::user::user_models::username_from_profile;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

pub fn create_oauth_client(
    client_id: String,
    client_secret: String,
    redirect_uri: String,
) -> anyhow::Result<BasicClient> {
    let client = BasicClient::new(
        ClientId::new(client_id),
        Some(ClientSecret::new(client_secret)),
        AuthUrl::new(GOOGLE_AUTH_URL.to_string())?,
        Some(TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?),
    )
    .set_redirect_uri(RedirectUrl::new(redirect_uri)?);

    Ok(client)
}

#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub given_name: String,
    pub picture: Option<String>,
}

impl GoogleUserInfo {
    pub fn username(&self) -> String {
        username_from_profile(&self.name, &self.email)
    }
}

/// Resolves a Google access token into the profile it belongs to.
pub async fn fetch_google_user(http: &reqwest::Client, access_token: &str) -> Result<GoogleUserInfo> {
    let response = http
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!("Google userinfo request failed: {}", e);
            AppError::Authentication("Failed to get user info".to_string())
        })?;

    if !response.status().is_success() {
        return Err(AppError::Authentication(
            "Invalid Google access token".to_string(),
        ));
    }

    response
        .json()
        .await
        .map_err(|_| AppError::Authentication("Failed to parse user info".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_valid_redirect() {
        let client = create_oauth_client(
            "id".into(),
            "secret".into(),
            "http://localhost:3000/api/google-login/callback".into(),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_bad_redirect() {
        assert!(create_oauth_client("id".into(), "secret".into(), "not a url".into()).is_err());
    }

    #[test]
    fn test_userinfo_parses_minimal_payload() {
        let info: GoogleUserInfo =
            serde_json::from_str(r#"{"id":"42","email":"ada@x.io","name":"Ada L"}"#).unwrap();
        assert_eq!(info.username(), "adal");
        assert!(info.picture.is_none());
    }
}
