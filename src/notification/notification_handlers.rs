use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::{error::Result, middleware::AuthUser, state::AppState};
use super::{notification_dto::MarkReadResponse, notification_models::Notification};

/// Notifications of the rooms the caller belongs to
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "List of notifications", body = Vec<Notification>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Notification>>> {
    let notifications = state.notification_service.list_for_user(user_id).await?;
    Ok(Json(notifications))
}

/// Get a notification
#[utoipa::path(
    get,
    path = "/api/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification", body = Notification),
        (status = 403, description = "Not a member of the notification's room"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn notification_detail(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>> {
    let notification = state.notification_service.get_for_user(id, user_id).await?;
    Ok(Json(notification))
}

/// Mark a notification as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/mark-as-read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = MarkReadResponse),
        (status = 403, description = "Not a member of the notification's room"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_as_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MarkReadResponse>> {
    state.notification_service.mark_as_read(id, user_id).await?;
    Ok(Json(MarkReadResponse {
        status: "Notification marked as read.".to_string(),
    }))
}

/// Subscribe to new notifications via Server-Sent Events
#[utoipa::path(
    get,
    path = "/api/notifications/stream",
    responses(
        (status = 200, description = "SSE stream of notifications"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn notification_stream(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    // Membership is snapshotted when the stream opens.
    let rooms = state.notification_service.member_rooms(user_id).await?;
    let rx = state.notification_service.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |msg| {
        let event = match msg {
            Ok(notification) if rooms.contains(&notification.room_id) => {
                serde_json::to_string(&notification)
                    .ok()
                    .map(|data| Ok(Event::default().event("notification").data(data)))
            }
            _ => None,
        };
        async move { event }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
