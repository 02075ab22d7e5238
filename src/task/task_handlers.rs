use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{auth::auth_dto::MessageResponse, error::Result, middleware::AuthUser, state::AppState};
use super::{
    task_dto::{CommentRequest, CreateTaskRequest, TaskDetail, UpdateTaskRequest},
    task_models::{Comment, Task},
};

/// List the tasks of a room
#[utoipa::path(
    get,
    path = "/api/room/{slug}/tasks",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 200, description = "Tasks of the room", body = Vec<Task>),
        (status = 404, description = "Room not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Task>>> {
    let tasks = state.task_service.list_tasks(&slug).await?;
    Ok(Json(tasks))
}

/// Create a task in a room
#[utoipa::path(
    post,
    path = "/api/room/{slug}/tasks",
    params(("slug" = String, Path, description = "Room slug")),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid payload or assignee"),
        (status = 404, description = "Room not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let task = state.task_service.create_task(&slug, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Get a task with its comments
#[utoipa::path(
    get,
    path = "/api/room/{slug}/tasks/{id}",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task found", body = TaskDetail),
        (status = 404, description = "Room or task not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path((slug, task_id)): Path<(String, Uuid)>,
) -> Result<Json<TaskDetail>> {
    let task = state.task_service.get_task(&slug, task_id).await?;
    Ok(Json(task))
}

/// Partially update a task
#[utoipa::path(
    put,
    path = "/api/room/{slug}/tasks/{id}",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("id" = Uuid, Path, description = "Task ID")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Invalid payload or assignee"),
        (status = 404, description = "Room or task not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path((slug, task_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    payload.validate()?;

    let task = state.task_service.update_task(&slug, task_id, payload).await?;
    Ok(Json(task))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/room/{slug}/tasks/{id}",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 404, description = "Room or task not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path((slug, task_id)): Path<(String, Uuid)>,
) -> Result<Json<MessageResponse>> {
    state.task_service.delete_task(&slug, task_id).await?;
    Ok(Json(MessageResponse::new("task deleted")))
}

/// Comment on a task
#[utoipa::path(
    post,
    path = "/api/room/{slug}/tasks/{id}/comments",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("id" = Uuid, Path, description = "Task ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 404, description = "Room or task not found")
    ),
    tag = "comments",
    security(("bearer_auth" = []))
)]
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((slug, task_id)): Path<(String, Uuid)>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let comment = state
        .task_service
        .create_comment(&slug, task_id, user_id, &payload.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Get a comment
#[utoipa::path(
    get,
    path = "/api/room/{slug}/comments/{id}",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("id" = Uuid, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment found", body = Comment),
        (status = 404, description = "Room or comment not found")
    ),
    tag = "comments",
    security(("bearer_auth" = []))
)]
pub async fn get_comment(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path((slug, comment_id)): Path<(String, Uuid)>,
) -> Result<Json<Comment>> {
    let comment = state.task_service.get_comment(&slug, comment_id).await?;
    Ok(Json(comment))
}

/// Edit a comment
#[utoipa::path(
    put,
    path = "/api/room/{slug}/comments/{id}",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("id" = Uuid, Path, description = "Comment ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 404, description = "Room or comment not found")
    ),
    tag = "comments",
    security(("bearer_auth" = []))
)]
pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path((slug, comment_id)): Path<(String, Uuid)>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Comment>> {
    payload.validate()?;

    let comment = state
        .task_service
        .update_comment(&slug, comment_id, &payload.text)
        .await?;
    Ok(Json(comment))
}

/// Delete a comment
#[utoipa::path(
    delete,
    path = "/api/room/{slug}/comments/{id}",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("id" = Uuid, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 404, description = "Room or comment not found")
    ),
    tag = "comments",
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path((slug, comment_id)): Path<(String, Uuid)>,
) -> Result<StatusCode> {
    state.task_service.delete_comment(&slug, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
