use crate::{error::Result, message::message_models::Message};
use sqlx::PgPool;
use uuid::Uuid;

const MESSAGE_COLUMNS: &str =
    "m.id, m.room_id, m.user_id, u.username AS \"user\", m.message, m.media_path, m.created_at";

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
        media_path: Option<&str>,
    ) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "WITH m AS (
                INSERT INTO messages (room_id, user_id, message, media_path)
                VALUES ($1, $2, $3, $4)
                RETURNING *
             )
             SELECT {MESSAGE_COLUMNS} FROM m JOIN users u ON u.id = m.user_id"
        ))
        .bind(room_id)
        .bind(user_id)
        .bind(message)
        .bind(media_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    /// Oldest first.
    pub async fn list_by_room(&self, room_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS}
             FROM messages m
             JOIN users u ON u.id = m.user_id
             WHERE m.room_id = $1
             ORDER BY m.created_at, m.id"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
