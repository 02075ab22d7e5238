use crate::auth::api_key::{generate_api_key, hash_api_key};
use crate::auth::auth_repository::{ApiKeyRepository, RefreshTokenRepository};
use crate::auth::jwt::{create_token, verify_token, TokenSettings, TokenType};
use crate::auth::oauth::GoogleUserInfo;
use crate::auth::password::{hash_password, verify_password};
use crate::db::DbPool;
use crate::error::{is_unique_violation, AppError, Result};
use crate::user::user_models::User;
use crate::user::user_repository::UserRepository;
use chrono::Utc;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// A freshly minted access/refresh pair.
pub struct IssuedTokens {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    user_repo: UserRepository,
    refresh_token_repo: RefreshTokenRepository,
    api_key_repo: ApiKeyRepository,
    tokens: TokenSettings,
}

impl AuthService {
    pub fn new(
        db: DbPool,
        user_repo: UserRepository,
        refresh_token_repo: RefreshTokenRepository,
        api_key_repo: ApiKeyRepository,
        tokens: TokenSettings,
    ) -> Self {
        Self {
            db,
            user_repo,
            refresh_token_repo,
            api_key_repo,
            tokens,
        }
    }

    pub fn token_settings(&self) -> &TokenSettings {
        &self.tokens
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        password: &str,
    ) -> Result<User> {
        let password_hash = hash_password(password)?;

        let mut tx = self.db.begin().await?;
        let user = self
            .user_repo
            .create_with_tx(&mut tx, username, email, first_name, &password_hash)
            .await
            .map_err(map_registration_conflict)?;
        tx.commit().await?;

        tracing::info!("User {} registered", user.username);
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedTokens> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".into()))?;

        let Some(ref password_hash) = user.password_hash else {
            return Err(AppError::Authentication("Please use Google login".into()));
        };

        if !verify_password(password, password_hash) {
            tracing::warn!("Rejected login for {}", email);
            return Err(AppError::Authentication("Invalid credentials".into()));
        }

        let mut tx = self.db.begin().await?;
        let issued = self.issue_tokens_with_tx(&mut tx, user).await?;
        tx.commit().await?;

        Ok(issued)
    }

    async fn issue_tokens_with_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: User,
    ) -> Result<IssuedTokens> {
        let access_token = create_token(user.id, &user.email, TokenType::Access, &self.tokens)?;
        let refresh_token = create_token(user.id, &user.email, TokenType::Refresh, &self.tokens)?;

        let expires_at = Utc::now() + self.tokens.refresh_ttl;
        self.refresh_token_repo
            .create_with_tx(tx, user.id, &refresh_token, expires_at)
            .await?;

        Ok(IssuedTokens {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a refresh token for a new pair. The old token is spent.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens> {
        let claims = verify_token(refresh_token, &self.tokens.secret, TokenType::Refresh)
            .map_err(|_| AppError::Authentication("Invalid refresh token".into()))?;

        let stored = self
            .refresh_token_repo
            .find_valid(refresh_token)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid refresh token".into()))?;

        if stored.user_id != claims.user_id()? {
            return Err(AppError::Authentication("Invalid refresh token".into()));
        }

        let user = self
            .user_repo
            .find_by_id(stored.user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".into()))?;

        let mut tx = self.db.begin().await?;
        if self
            .refresh_token_repo
            .delete_by_token_with_tx(&mut tx, refresh_token)
            .await?
            == 0
        {
            return Err(AppError::Authentication("Invalid refresh token".into()));
        }
        let issued = self.issue_tokens_with_tx(&mut tx, user).await?;
        tx.commit().await?;

        Ok(issued)
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        self.refresh_token_repo.delete_by_token(refresh_token).await?;
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        ensure_password_change(
            user.password_hash.as_deref(),
            old_password,
            new_password,
            confirm_password,
        )?;

        let password_hash = hash_password(new_password)?;
        self.user_repo.update_password(user.id, &password_hash).await?;
        let revoked = self.refresh_token_repo.delete_by_user(user.id).await?;

        tracing::info!("User {} changed password, {} sessions revoked", user.id, revoked);
        Ok(())
    }

    pub async fn google_login(&self, info: &GoogleUserInfo) -> Result<IssuedTokens> {
        let mut tx = self.db.begin().await?;

        let user = self
            .user_repo
            .upsert_google_user_with_tx(
                &mut tx,
                &info.username(),
                &info.email,
                &info.given_name,
                &info.id,
                info.picture.as_deref(),
            )
            .await?;
        let issued = self.issue_tokens_with_tx(&mut tx, user).await?;

        tx.commit().await?;
        tracing::info!("Google login for {}", issued.user.username);
        Ok(issued)
    }

    /// Stores a new key and returns its plaintext, which is never kept.
    pub async fn generate_api_key(&self, user_id: Uuid) -> Result<String> {
        let key = generate_api_key();
        self.api_key_repo
            .create(user_id, &key.hash, &key.prefix)
            .await?;

        tracing::info!("API key {}... generated for {}", key.prefix, user_id);
        Ok(key.plaintext)
    }

    pub async fn authenticate_api_key(&self, key: &str) -> Result<Option<Uuid>> {
        let api_key = self.api_key_repo.touch_by_hash(&hash_api_key(key)).await?;
        Ok(api_key.map(|k| k.user_id))
    }

    pub async fn purge_expired_refresh_tokens(&self) -> Result<u64> {
        self.refresh_token_repo.delete_expired().await
    }
}

fn map_registration_conflict(err: AppError) -> AppError {
    if is_unique_violation(&err, Some("users_username_key")) {
        AppError::field("username", "Username already taken.")
    } else if is_unique_violation(&err, Some("users_email_key")) {
        AppError::field("email", "Email already registered.")
    } else {
        err
    }
}

pub fn ensure_password_change(
    current_hash: Option<&str>,
    old_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<()> {
    let old_matches = current_hash.is_some_and(|hash| verify_password(old_password, hash));
    if !old_matches {
        return Err(AppError::field("old_password", "Old password is incorrect."));
    }

    if new_password != confirm_password {
        return Err(AppError::field(
            "confirm_password",
            "New password and confirm password do not match.",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<()>) -> &'static str {
        match result {
            Err(AppError::FieldValidation { field, .. }) => field,
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_password_change_checks_old_password_first() {
        let hash = bcrypt::hash("old-password", 4).unwrap();
        assert_eq!(
            field_of(ensure_password_change(Some(&hash), "nope", "a", "b")),
            "old_password"
        );
    }

    #[test]
    fn test_password_change_requires_matching_confirmation() {
        let hash = bcrypt::hash("old-password", 4).unwrap();
        assert_eq!(
            field_of(ensure_password_change(
                Some(&hash),
                "old-password",
                "new-password-1",
                "new-password-2"
            )),
            "confirm_password"
        );
        assert!(ensure_password_change(
            Some(&hash),
            "old-password",
            "new-password-1",
            "new-password-1"
        )
        .is_ok());
    }

    #[test]
    fn test_google_only_account_has_no_old_password() {
        assert_eq!(
            field_of(ensure_password_change(None, "", "x", "x")),
            "old_password"
        );
    }

    #[test]
    fn test_unrelated_errors_pass_through_conflict_mapping() {
        assert!(matches!(
            map_registration_conflict(AppError::InternalError),
            AppError::InternalError
        ));
    }
}
