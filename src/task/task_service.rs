use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::notification::notification_models::{COMMENT_SUBJECT, TASK_SUBJECT};
use crate::notification::{Notification, NotificationService};
use crate::room::room_models::Room;
use crate::room::room_repository::RoomRepository;
use crate::room::room_service::RoomService;
use crate::task::task_dto::{CreateTaskRequest, TaskDetail, UpdateTaskRequest};
use crate::task::task_models::{
    comment_notification_text, ensure_valid_assignee, task_notification_text, Comment, Task,
    TaskStatus,
};
use crate::task::task_repository::{CommentRepository, TaskRepository};
use crate::user::user_models::User;
use crate::user::user_repository::UserRepository;
use uuid::Uuid;

/// Service layer for tasks and their comments. Every operation is scoped
/// to the room named in the path.
#[derive(Clone)]
pub struct TaskService {
    db: DbPool,
    repo: TaskRepository,
    comments: CommentRepository,
    rooms: RoomService,
    room_repo: RoomRepository,
    users: UserRepository,
    notifications: NotificationService,
}

impl TaskService {
    pub fn new(
        db: DbPool,
        repo: TaskRepository,
        comments: CommentRepository,
        rooms: RoomService,
        room_repo: RoomRepository,
        users: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            db,
            repo,
            comments,
            rooms,
            room_repo,
            users,
            notifications,
        }
    }

    pub async fn list_tasks(&self, slug: &str) -> Result<Vec<Task>> {
        let room = self.rooms.find_room(slug).await?;
        self.repo.find_by_room(room.id).await
    }

    pub async fn tasks_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>> {
        self.repo.find_assigned_to(user_id).await
    }

    async fn find_task(&self, room: &Room, task_id: Uuid) -> Result<Task> {
        self.repo
            .find_by_id(task_id, room.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    pub async fn get_task(&self, slug: &str, task_id: Uuid) -> Result<TaskDetail> {
        let room = self.rooms.find_room(slug).await?;
        let task = self.find_task(&room, task_id).await?;
        let comments = self.comments.find_by_task(task.id).await?;
        Ok(TaskDetail { task, comments })
    }

    /// Resolves an assignee username and checks it belongs to the room.
    async fn resolve_assignee(&self, room: &Room, username: &str) -> Result<User> {
        let user = self.users.find_by_username(username).await?.ok_or_else(|| {
            AppError::field(
                "assigned_to",
                format!("Object with username={} does not exist.", username),
            )
        })?;

        let is_member = self.room_repo.is_member(room.id, user.id).await?;
        ensure_valid_assignee(room.created_by, user.id, is_member)?;
        Ok(user)
    }

    pub async fn create_task(
        &self,
        slug: &str,
        creator: Uuid,
        payload: CreateTaskRequest,
    ) -> Result<Task> {
        let room = self.rooms.find_room(slug).await?;
        let assignee = self.resolve_assignee(&room, &payload.assigned_to).await?;

        let mut tx = self.db.begin().await?;
        let task = self
            .repo
            .create_with_tx(
                &mut tx,
                room.id,
                &payload.title,
                &payload.description,
                payload.due_date,
                payload.status.unwrap_or(TaskStatus::Pending),
                assignee.id,
                creator,
            )
            .await?;
        let notification = self
            .notifications
            .record_with_tx(
                &mut tx,
                room.id,
                creator,
                &task_notification_text(&task.title, &room.name),
            )
            .await?;
        tx.commit().await?;

        tracing::info!("Task {} created in room {}", task.id, room.slug);
        self.notify(notification, assignee.email, TASK_SUBJECT);
        Ok(task)
    }

    pub async fn update_task(
        &self,
        slug: &str,
        task_id: Uuid,
        payload: UpdateTaskRequest,
    ) -> Result<Task> {
        let room = self.rooms.find_room(slug).await?;
        let task = self.find_task(&room, task_id).await?;

        let assigned_to = match payload.assigned_to.as_deref() {
            Some(username) => Some(self.resolve_assignee(&room, username).await?.id),
            None => None,
        };

        self.repo
            .update(
                task.id,
                room.id,
                payload.title.as_deref(),
                payload.description.as_deref(),
                payload.due_date,
                payload.status,
                assigned_to,
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    pub async fn delete_task(&self, slug: &str, task_id: Uuid) -> Result<()> {
        let room = self.rooms.find_room(slug).await?;
        if self.repo.soft_delete(task_id, room.id).await? == 0 {
            return Err(AppError::NotFound("Task not found".into()));
        }
        tracing::info!("Task {} deleted from room {}", task_id, room.slug);
        Ok(())
    }

    pub async fn create_comment(
        &self,
        slug: &str,
        task_id: Uuid,
        author: Uuid,
        text: &str,
    ) -> Result<Comment> {
        let room = self.rooms.find_room(slug).await?;
        let task = self.find_task(&room, task_id).await?;

        let mut tx = self.db.begin().await?;
        let comment = self
            .comments
            .create_with_tx(&mut tx, task.id, author, text)
            .await?;
        let notification = self
            .notifications
            .record_with_tx(
                &mut tx,
                room.id,
                author,
                &comment_notification_text(&task.title, &room.name),
            )
            .await?;
        tx.commit().await?;

        match self.users.find_by_id(task.assigned_to_id).await? {
            Some(assignee) => self.notify(notification, assignee.email, COMMENT_SUBJECT),
            None => tracing::warn!("Assignee of task {} no longer exists", task.id),
        }
        Ok(comment)
    }

    async fn find_comment(&self, slug: &str, comment_id: Uuid) -> Result<Comment> {
        let room = self.rooms.find_room(slug).await?;
        self.comments
            .find_in_room(comment_id, room.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))
    }

    pub async fn get_comment(&self, slug: &str, comment_id: Uuid) -> Result<Comment> {
        self.find_comment(slug, comment_id).await
    }

    pub async fn update_comment(&self, slug: &str, comment_id: Uuid, text: &str) -> Result<Comment> {
        let comment = self.find_comment(slug, comment_id).await?;
        self.comments
            .update_text(comment.id, text)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))
    }

    pub async fn delete_comment(&self, slug: &str, comment_id: Uuid) -> Result<()> {
        let comment = self.find_comment(slug, comment_id).await?;
        self.comments.delete(comment.id).await?;
        Ok(())
    }

    /// Mail and broadcast run off the request path.
    fn notify(&self, notification: Notification, recipient: String, subject: &'static str) {
        let notifications = self.notifications.clone();
        tokio::spawn(async move {
            notifications.dispatch(notification, &recipient, subject).await;
        });
    }
}
