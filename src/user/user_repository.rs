use crate::error::Result;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use super::user_models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
        email: &str,
        first_name: &str,
        password_hash: &str,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, first_name, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(password_hash)
        .fetch_one(&mut **tx)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Links a Google identity. An existing account with the same email is
    /// adopted instead of failing on the email constraint.
    pub async fn upsert_google_user_with_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
        email: &str,
        first_name: &str,
        google_id: &str,
        avatar_url: Option<&str>,
    ) -> Result<User> {
        let linked = sqlx::query_as::<_, User>(
            "UPDATE users
             SET google_id = $2, avatar_url = COALESCE($3, avatar_url), updated_at = NOW()
             WHERE email = $1 OR google_id = $2
             RETURNING *",
        )
        .bind(email)
        .bind(google_id)
        .bind(avatar_url)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(user) = linked {
            return Ok(user);
        }

        // Usernames are unique, so suffix a short id when the preferred one is taken.
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, first_name, google_id, avatar_url)
             VALUES (
                CASE WHEN EXISTS (SELECT 1 FROM users WHERE username = $1)
                     THEN $1 || '_' || substr(md5(random()::text), 1, 6)
                     ELSE $1 END,
                $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(google_id)
        .bind(avatar_url)
        .fetch_one(&mut **tx)
        .await?;

        Ok(user)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET
                username = COALESCE($2, username),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(user_id)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
