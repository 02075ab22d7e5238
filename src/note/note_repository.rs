use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;
use super::note_models::UserNote;

/// Every query is scoped to the owning user.
#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, title: &str, content: &str) -> Result<UserNote> {
        let note = sqlx::query_as::<_, UserNote>(
            "INSERT INTO user_notes (user_id, title, content)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(note)
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<UserNote>> {
        let notes = sqlx::query_as::<_, UserNote>(
            "SELECT * FROM user_notes WHERE user_id = $1 ORDER BY last_saved DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    pub async fn find_by_id(&self, note_id: Uuid, user_id: Uuid) -> Result<Option<UserNote>> {
        let note = sqlx::query_as::<_, UserNote>(
            "SELECT * FROM user_notes WHERE id = $1 AND user_id = $2",
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(note)
    }

    pub async fn update(
        &self,
        note_id: Uuid,
        user_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Option<UserNote>> {
        let note = sqlx::query_as::<_, UserNote>(
            "UPDATE user_notes
             SET title = $3, content = $4, last_saved = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(note_id)
        .bind(user_id)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(note)
    }

    pub async fn delete(&self, note_id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_notes WHERE id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
