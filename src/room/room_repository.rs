use crate::error::Result;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use super::room_models::{Room, RoomMember};

const LIVE_ROOM: &str = "SELECT * FROM rooms WHERE deleted_at IS NULL";

#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        slug: &str,
        description: Option<&str>,
        is_private: bool,
        created_by: Uuid,
    ) -> Result<Room> {
        let room = sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (name, slug, description, is_private, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(is_private)
        .bind(created_by)
        .fetch_one(&mut **tx)
        .await?;

        Ok(room)
    }

    pub async fn add_member_with_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        room_id: Uuid,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO room_members (room_id, user_id, is_admin)
             VALUES ($1, $2, $3)
             ON CONFLICT (room_id, user_id) DO NOTHING",
        )
        .bind(room_id)
        .bind(user_id)
        .bind(is_admin)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(&format!("{LIVE_ROOM} AND slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(room)
    }

    pub async fn find_by_id(&self, room_id: Uuid) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(&format!("{LIVE_ROOM} AND id = $1"))
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(room)
    }

    /// Returns true when the user was not a member before.
    pub async fn add_member(&self, room_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO room_members (room_id, user_id)
             VALUES ($1, $2)
             ON CONFLICT (room_id, user_id) DO NOTHING",
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn is_member(&self, room_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM room_members WHERE room_id = $1 AND user_id = $2)",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn find_member_by_username(
        &self,
        room_id: Uuid,
        username: &str,
    ) -> Result<Option<RoomMember>> {
        let member = sqlx::query_as::<_, RoomMember>(
            "SELECT m.user_id, u.username, m.is_admin
             FROM room_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.room_id = $1 AND u.username = $2",
        )
        .bind(room_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    pub async fn list_members(&self, room_id: Uuid) -> Result<Vec<RoomMember>> {
        let members = sqlx::query_as::<_, RoomMember>(
            "SELECT m.user_id, u.username, m.is_admin
             FROM room_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.room_id = $1
             ORDER BY m.joined_at, u.username",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    pub async fn remove_member(&self, room_id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM room_members WHERE room_id = $1 AND user_id = $2")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_admin(&self, room_id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE room_members SET is_admin = TRUE WHERE room_id = $1 AND user_id = $2",
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Flips the like and returns whether the room is now liked.
    pub async fn toggle_like(&self, room_id: Uuid, user_id: Uuid) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM room_likes WHERE room_id = $1 AND user_id = $2")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO room_likes (room_id, user_id)
             VALUES ($1, $2)
             ON CONFLICT (room_id, user_id) DO NOTHING",
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    pub async fn count_likes(&self, room_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_likes WHERE room_id = $1")
            .bind(room_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn creator_username(&self, room: &Room) -> Result<Option<String>> {
        let Some(creator_id) = room.created_by else {
            return Ok(None);
        };

        let username: Option<String> =
            sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
                .bind(creator_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(username)
    }

    pub async fn soft_delete(&self, room_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE rooms SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_joined_by_user(&self, user_id: Uuid) -> Result<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(
            "SELECT r.* FROM rooms r
             JOIN room_members m ON m.room_id = r.id
             WHERE m.user_id = $1 AND r.deleted_at IS NULL
             ORDER BY m.joined_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    pub async fn member_room_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT m.room_id FROM room_members m
             JOIN rooms r ON r.id = m.room_id
             WHERE m.user_id = $1 AND r.deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn find_created_by_user(&self, user_id: Uuid) -> Result<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(&format!(
            "{LIVE_ROOM} AND created_by = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    /// Case-insensitive substring match on the room name. `pattern` must
    /// already be an escaped LIKE pattern.
    pub async fn search_by_name(&self, pattern: &str, limit: i64, offset: i64) -> Result<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(&format!(
            "{LIVE_ROOM} AND name ILIKE $1 ESCAPE '\\'
             ORDER BY name, id
             LIMIT $2 OFFSET $3"
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    pub async fn count_by_name(&self, pattern: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rooms
             WHERE deleted_at IS NULL AND name ILIKE $1 ESCAPE '\\'",
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
