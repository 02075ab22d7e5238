use crate::error::Result;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use super::notification_models::Notification;

const NOTIFICATION_COLUMNS: &str =
    "n.id, n.room_id, n.sender_id, u.username AS sender, n.message, n.is_read, n.created_at";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        room_id: Uuid,
        sender_id: Uuid,
        message: &str,
    ) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "WITH n AS (
                INSERT INTO notifications (room_id, sender_id, message)
                VALUES ($1, $2, $3)
                RETURNING *
             )
             SELECT {NOTIFICATION_COLUMNS} FROM n JOIN users u ON u.id = n.sender_id"
        ))
        .bind(room_id)
        .bind(sender_id)
        .bind(message)
        .fetch_one(&mut **tx)
        .await?;

        Ok(notification)
    }

    /// Notifications of every live room the user belongs to, newest first.
    pub async fn find_for_member(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS}
             FROM notifications n
             JOIN users u ON u.id = n.sender_id
             JOIN room_members m ON m.room_id = n.room_id AND m.user_id = $1
             JOIN rooms r ON r.id = n.room_id AND r.deleted_at IS NULL
             ORDER BY n.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS}
             FROM notifications n
             JOIN users u ON u.id = n.sender_id
             WHERE n.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn mark_as_read(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
