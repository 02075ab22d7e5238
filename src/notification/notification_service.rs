use std::collections::HashSet;

use sqlx::{Postgres, Transaction};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::room::room_models::ensure_member;
use crate::room::room_repository::RoomRepository;
use super::mailer::Mailer;
use super::notification_models::{email_body, Notification};
use super::notification_repository::NotificationRepository;

/// Records room notifications and fans them out after commit.
#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    room_repo: RoomRepository,
    mailer: Mailer,
    tx: broadcast::Sender<Notification>,
}

impl NotificationService {
    pub fn new(
        repo: NotificationRepository,
        room_repo: RoomRepository,
        mailer: Mailer,
        tx: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            repo,
            room_repo,
            mailer,
            tx,
        }
    }

    pub async fn record_with_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        room_id: Uuid,
        sender_id: Uuid,
        message: &str,
    ) -> Result<Notification> {
        self.repo.create_with_tx(tx, room_id, sender_id, message).await
    }

    /// Broadcasts a committed notification and emails `recipient`. Delivery
    /// failures are logged and never surface to the caller.
    pub async fn dispatch(&self, notification: Notification, recipient: &str, subject: &str) {
        let body = email_body(&notification.message, &self.mailer.sender());
        if let Err(e) = self.mailer.send(recipient, subject, &body).await {
            tracing::error!("Failed to email notification {}: {}", notification.id, e);
        }

        // No receivers is fine.
        let _ = self.tx.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub async fn member_rooms(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids = self.room_repo.member_room_ids(user_id).await?;
        Ok(ids.into_iter().collect())
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        self.repo.find_for_member(user_id).await
    }

    pub async fn get_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Notification> {
        let notification = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;

        let is_member = self.room_repo.is_member(notification.room_id, user_id).await?;
        ensure_member(is_member)?;
        Ok(notification)
    }

    pub async fn mark_as_read(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let notification = self.get_for_user(id, user_id).await?;
        self.repo.mark_as_read(notification.id).await?;
        Ok(())
    }
}
