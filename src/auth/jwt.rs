use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub token_type: TokenType,
    /// Unique per token so two tokens minted in the same second differ.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token claims".to_string()))
    }
}

/// Secret and lifetimes used to mint tokens.
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    pub fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }
}

pub fn create_token(
    user_id: Uuid,
    email: &str,
    token_type: TokenType,
    settings: &TokenSettings,
) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(settings.ttl(token_type))
        .ok_or(AppError::InternalError)?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        token_type,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|_| AppError::Authentication("Failed to create token".to_string()))
}

/// Verify signature, expiry and that the token is of the expected kind.
pub fn verify_token(token: &str, secret: &str, expected: TokenType) -> Result<Claims> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    if claims.token_type != expected {
        return Err(AppError::Unauthorized("Invalid token type".to_string()));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TokenSettings {
        TokenSettings {
            secret: "test-secret".into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, "a@x.io", TokenType::Access, &settings()).unwrap();
        let claims = verify_token(&token, "test-secret", TokenType::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "a@x.io");
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let token = create_token(Uuid::new_v4(), "a@x.io", TokenType::Refresh, &settings()).unwrap();
        assert!(matches!(
            verify_token(&token, "test-secret", TokenType::Access),
            Err(AppError::Unauthorized(_))
        ));
        assert!(verify_token(&token, "test-secret", TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(Uuid::new_v4(), "a@x.io", TokenType::Access, &settings()).unwrap();
        assert!(verify_token(&token, "other", TokenType::Access).is_err());
    }

    #[test]
    fn test_tokens_minted_together_differ() {
        let user_id = Uuid::new_v4();
        let a = create_token(user_id, "a@x.io", TokenType::Refresh, &settings()).unwrap();
        let b = create_token(user_id, "a@x.io", TokenType::Refresh, &settings()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = TokenSettings {
            access_ttl: Duration::minutes(-10),
            ..settings()
        };
        let token = create_token(Uuid::new_v4(), "a@x.io", TokenType::Access, &expired).unwrap();
        assert!(verify_token(&token, "test-secret", TokenType::Access).is_err());
    }
}
