use axum::extract::Multipart;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::message::message_models::{ensure_has_content, normalize_text, RoomMessage};
use crate::message::message_repository::MessageRepository;
use crate::room::room_models::{ensure_member, Room};
use crate::room::room_service::RoomService;
use crate::storage::{FileStorage, StoredFile, MESSAGE_MEDIA_DIR};
use crate::websocket::{types::WsMessage, ConnectionManager};

/// Room chat. Every stored message is fanned out to the room's sockets.
#[derive(Clone)]
pub struct MessageService {
    repo: MessageRepository,
    rooms: RoomService,
    storage: FileStorage,
    connections: ConnectionManager,
}

impl MessageService {
    pub fn new(
        repo: MessageRepository,
        rooms: RoomService,
        storage: FileStorage,
        connections: ConnectionManager,
    ) -> Self {
        Self {
            repo,
            rooms,
            storage,
            connections,
        }
    }

    /// Sends from a multipart form with a `message` text part and an optional
    /// `media` file part.
    pub async fn send(
        &self,
        slug: &str,
        user_id: Uuid,
        multipart: Multipart,
    ) -> Result<RoomMessage> {
        let room = self.rooms.find_room(slug).await?;
        ensure_member(self.rooms.is_member(&room, user_id).await?)?;

        let (text, media) = read_message_form(&self.storage, multipart).await?;
        self.store(&room, user_id, normalize_text(text), media).await
    }

    /// Text-only send used by the WebSocket endpoint. Membership is checked
    /// when the socket is opened.
    pub async fn send_text(&self, room: &Room, user_id: Uuid, text: String) -> Result<RoomMessage> {
        self.store(room, user_id, normalize_text(Some(text)), None).await
    }

    async fn store(
        &self,
        room: &Room,
        user_id: Uuid,
        text: Option<String>,
        media: Option<StoredFile>,
    ) -> Result<RoomMessage> {
        ensure_has_content(text.as_deref(), media.is_some())?;

        let media_path = media.as_ref().map(|m| m.relative_path.as_str());
        let message = match self
            .repo
            .create(room.id, user_id, text.as_deref(), media_path)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                if let Some(media) = &media {
                    self.storage.discard(media).await;
                }
                return Err(e);
            }
        };

        let response = RoomMessage::from(message);
        let delivered = self
            .connections
            .broadcast_to_room(room.id, WsMessage::ChatMessage(response.clone()));
        tracing::debug!("Message {} delivered to {} sockets", response.id, delivered);

        Ok(response)
    }

    pub async fn list(&self, slug: &str, user_id: Uuid) -> Result<Vec<RoomMessage>> {
        let room = self.rooms.readable_room(slug, user_id).await?;
        let messages = self.repo.list_by_room(room.id).await?;
        Ok(messages.into_iter().map(RoomMessage::from).collect())
    }
}

/// Reads the `message` text part and the optional `media` file part. Stored
/// media is removed again when a later part fails.
async fn read_message_form(
    storage: &FileStorage,
    mut multipart: Multipart,
) -> Result<(Option<String>, Option<StoredFile>)> {
    let mut text: Option<String> = None;
    let mut media: Option<StoredFile> = None;

    let read = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            let part = field.name().unwrap_or_default().to_string();
            match part.as_str() {
                "message" => {
                    text = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| AppError::BadRequest(e.to_string()))?,
                    );
                }
                "media" if media.is_none() && field.file_name().is_some() => {
                    media = Some(storage.save_field(MESSAGE_MEDIA_DIR, field).await?);
                }
                _ => {}
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(e) = read {
        if let Some(media) = &media {
            storage.discard(media).await;
        }
        return Err(e);
    }
    Ok((text, media))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{header, Request},
    };

    const BOUNDARY: &str = "chat-boundary";

    async fn form(body: String) -> Multipart {
        let request = Request::post("/messages")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn media_part() -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"media\"; filename=\"cat.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             meow\r\n"
        )
    }

    #[tokio::test]
    async fn test_reads_text_and_media() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let body = format!(
            "{}--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"message\"\r\n\r\n\
             look at this\r\n\
             --{BOUNDARY}--\r\n",
            media_part()
        );

        let (text, media) = read_message_form(&storage, form(body).await).await.unwrap();
        assert_eq!(text.as_deref(), Some("look at this"));
        let media = media.unwrap();
        assert!(media.relative_path.starts_with("media/"));
        assert!(storage.absolute(&media.relative_path).exists());
    }

    #[tokio::test]
    async fn test_broken_text_part_removes_stored_media() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        // The `message` part never reaches its closing boundary.
        let body = format!(
            "{}--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"message\"\r\n\r\n\
             cut off",
            media_part()
        );

        let result = read_message_form(&storage, form(body).await).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let mut entries = tokio::fs::read_dir(dir.path().join(MESSAGE_MEDIA_DIR)).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
