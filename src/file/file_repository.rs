use crate::error::Result;
use crate::storage::StoredFile;
use sqlx::PgPool;
use uuid::Uuid;
use super::file_models::RoomFile;

const FILE_COLUMNS: &str = "f.id, f.room_id, f.name, f.path, f.content_type, f.size_bytes,
    f.uploaded_by, u.username AS uploader, f.is_staged, f.uploaded_at";

#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// New uploads always start out staged.
    pub async fn create_staged(
        &self,
        room_id: Uuid,
        uploaded_by: Uuid,
        stored: &StoredFile,
    ) -> Result<RoomFile> {
        let file = sqlx::query_as::<_, RoomFile>(&format!(
            "WITH f AS (
                INSERT INTO room_files (room_id, name, path, content_type, size_bytes, uploaded_by, is_staged)
                VALUES ($1, $2, $3, $4, $5, $6, TRUE)
                RETURNING *
             )
             SELECT {FILE_COLUMNS} FROM f JOIN users u ON u.id = f.uploaded_by"
        ))
        .bind(room_id)
        .bind(&stored.name)
        .bind(&stored.relative_path)
        .bind(stored.content_type.as_deref())
        .bind(stored.size_bytes)
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    /// Room owning a stored path, either as a room file or as chat media.
    pub async fn room_for_media(&self, path: &str) -> Result<Option<Uuid>> {
        let room_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT room_id FROM room_files WHERE path = $1
             UNION ALL
             SELECT room_id FROM messages WHERE media_path = $1
             LIMIT 1",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room_id)
    }

    pub async fn find_staged(&self, file_id: Uuid, room_id: Uuid) -> Result<Option<RoomFile>> {
        let file = sqlx::query_as::<_, RoomFile>(&format!(
            "SELECT {FILE_COLUMNS}
             FROM room_files f
             JOIN users u ON u.id = f.uploaded_by
             WHERE f.id = $1 AND f.room_id = $2 AND f.is_staged"
        ))
        .bind(file_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    pub async fn list_by_room(&self, room_id: Uuid, staged: bool) -> Result<Vec<RoomFile>> {
        let files = sqlx::query_as::<_, RoomFile>(&format!(
            "SELECT {FILE_COLUMNS}
             FROM room_files f
             JOIN users u ON u.id = f.uploaded_by
             WHERE f.room_id = $1 AND f.is_staged = $2
             ORDER BY f.uploaded_at"
        ))
        .bind(room_id)
        .bind(staged)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    /// Clears the staged flag. Returns 0 when the file was no longer staged.
    pub async fn unstage(&self, file_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE room_files SET is_staged = FALSE WHERE id = $1 AND is_staged",
        )
        .bind(file_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(&self, file_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM room_files WHERE id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
