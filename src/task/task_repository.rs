use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use super::task_models::{Comment, Task, TaskStatus};

const TASK_COLUMNS: &str = "t.id, t.room_id, t.title, t.description, t.due_date, t.status,
    t.assigned_to AS assigned_to_id, a.username AS assigned_to,
    t.created_by AS created_by_id, c.username AS created_by,
    t.created_at, t.updated_at";

const TASK_JOINS: &str = "JOIN users a ON a.id = t.assigned_to
    JOIN users c ON c.id = t.created_by";

const COMMENT_COLUMNS: &str =
    "cm.id, cm.task_id, cm.user_id, u.username, cm.text, cm.created_at, cm.updated_at";

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        room_id: Uuid,
        title: &str,
        description: &str,
        due_date: NaiveDate,
        status: TaskStatus,
        assigned_to: Uuid,
        created_by: Uuid,
    ) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "WITH t AS (
                INSERT INTO tasks (room_id, title, description, due_date, status, assigned_to, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
             )
             SELECT {TASK_COLUMNS} FROM t {TASK_JOINS}"
        ))
        .bind(room_id)
        .bind(title)
        .bind(description)
        .bind(due_date)
        .bind(status)
        .bind(assigned_to)
        .bind(created_by)
        .fetch_one(&mut **tx)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id(&self, task_id: Uuid, room_id: Uuid) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t {TASK_JOINS}
             WHERE t.id = $1 AND t.room_id = $2 AND t.deleted_at IS NULL"
        ))
        .bind(task_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    pub async fn find_by_room(&self, room_id: Uuid) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t {TASK_JOINS}
             WHERE t.room_id = $1 AND t.deleted_at IS NULL
             ORDER BY t.created_at"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn find_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t {TASK_JOINS}
             JOIN rooms r ON r.id = t.room_id
             WHERE t.assigned_to = $1 AND t.deleted_at IS NULL AND r.deleted_at IS NULL
             ORDER BY t.due_date, t.created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        task_id: Uuid,
        room_id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        due_date: Option<NaiveDate>,
        status: Option<TaskStatus>,
        assigned_to: Option<Uuid>,
    ) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "WITH t AS (
                UPDATE tasks SET
                    title = COALESCE($3, title),
                    description = COALESCE($4, description),
                    due_date = COALESCE($5, due_date),
                    status = COALESCE($6, status),
                    assigned_to = COALESCE($7, assigned_to),
                    updated_at = NOW()
                WHERE id = $1 AND room_id = $2 AND deleted_at IS NULL
                RETURNING *
             )
             SELECT {TASK_COLUMNS} FROM t {TASK_JOINS}"
        ))
        .bind(task_id)
        .bind(room_id)
        .bind(title)
        .bind(description)
        .bind(due_date)
        .bind(status)
        .bind(assigned_to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    pub async fn soft_delete(&self, task_id: Uuid, room_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW()
             WHERE id = $1 AND room_id = $2 AND deleted_at IS NULL",
        )
        .bind(task_id)
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        task_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "WITH cm AS (
                INSERT INTO comments (task_id, user_id, text)
                VALUES ($1, $2, $3)
                RETURNING *
             )
             SELECT {COMMENT_COLUMNS} FROM cm JOIN users u ON u.id = cm.user_id"
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(&mut **tx)
        .await?;

        Ok(comment)
    }

    /// Looks a comment up through its task so it can be scoped to a room.
    pub async fn find_in_room(&self, comment_id: Uuid, room_id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS}
             FROM comments cm
             JOIN users u ON u.id = cm.user_id
             JOIN tasks t ON t.id = cm.task_id
             WHERE cm.id = $1 AND t.room_id = $2 AND t.deleted_at IS NULL"
        ))
        .bind(comment_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    pub async fn find_by_task(&self, task_id: Uuid) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS}
             FROM comments cm
             JOIN users u ON u.id = cm.user_id
             WHERE cm.task_id = $1
             ORDER BY cm.created_at"
        ))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    pub async fn update_text(&self, comment_id: Uuid, text: &str) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "WITH cm AS (
                UPDATE comments SET text = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COMMENT_COLUMNS} FROM cm JOIN users u ON u.id = cm.user_id"
        ))
        .bind(comment_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    pub async fn delete(&self, comment_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
