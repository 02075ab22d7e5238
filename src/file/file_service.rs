use std::path::PathBuf;

use axum::extract::Multipart;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::file::file_models::{decide, RoomFileResponse, StagingDecision};
use crate::file::file_repository::FileRepository;
use crate::room::room_models::ensure_member;
use crate::room::room_service::RoomService;
use crate::storage::{FileStorage, StoredFile, MAX_FILE_NAME_LEN, ROOM_FILES_DIR};

/// Upload, staging decisions and listings of room files.
#[derive(Clone)]
pub struct FileService {
    repo: FileRepository,
    rooms: RoomService,
    storage: FileStorage,
}

impl FileService {
    pub fn new(repo: FileRepository, rooms: RoomService, storage: FileStorage) -> Self {
        Self {
            repo,
            rooms,
            storage,
        }
    }

    /// Stores the `file` part of the form and records it as staged. An
    /// optional `name` part overrides the original file name.
    pub async fn upload(
        &self,
        slug: &str,
        uploader: Uuid,
        multipart: Multipart,
    ) -> Result<RoomFileResponse> {
        let room = self.rooms.find_room(slug).await?;
        ensure_member(self.rooms.is_member(&room, uploader).await?)?;

        let stored = read_upload_form(&self.storage, multipart).await?;

        match self.repo.create_staged(room.id, uploader, &stored).await {
            Ok(file) => {
                tracing::info!("File {} staged in room {}", file.id, room.slug);
                Ok(file.into())
            }
            Err(e) => {
                self.storage.discard(&stored).await;
                Err(e)
            }
        }
    }

    pub async fn decide(
        &self,
        slug: &str,
        file_id: Uuid,
        requester: Uuid,
        decision: Option<&str>,
    ) -> Result<&'static str> {
        let room = self.rooms.find_room(slug).await?;
        let file = self
            .repo
            .find_staged(file_id, room.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Staged file not found".into()))?;

        let decision = decide(&file, requester, decision)?;
        match decision {
            StagingDecision::Add => {
                if self.repo.unstage(file.id).await? == 0 {
                    return Err(AppError::NotFound("Staged file not found".into()));
                }
            }
            StagingDecision::Remove => {
                self.repo.delete(file.id).await?;
                if let Err(e) = self.storage.remove(&file.path).await {
                    tracing::error!("Could not delete stored file {}: {}", file.path, e);
                }
            }
        }

        tracing::info!("Staged file {} in room {}: {:?}", file.id, room.slug, decision);
        Ok(decision.outcome())
    }

    /// Absolute location of a stored file, for callers that can read the
    /// room it belongs to. Paths nothing refers to are reported as missing.
    pub async fn readable_media(&self, path: &str, user_id: Uuid) -> Result<PathBuf> {
        let room_id = self
            .repo
            .room_for_media(path)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".into()))?;
        self.rooms.readable_room_by_id(room_id, user_id).await?;
        Ok(self.storage.absolute(path))
    }

    pub async fn list(&self, slug: &str, user_id: Uuid, staged: bool) -> Result<Vec<RoomFileResponse>> {
        let room = self.rooms.readable_room(slug, user_id).await?;
        let files = self.repo.list_by_room(room.id, staged).await?;
        Ok(files.into_iter().map(RoomFileResponse::from).collect())
    }
}

/// Reads the `file` part and the optional `name` part. A file that was
/// already written is removed again when a later part fails.
async fn read_upload_form(storage: &FileStorage, mut multipart: Multipart) -> Result<StoredFile> {
    let mut stored: Option<StoredFile> = None;
    let mut display_name: Option<String> = None;

    let read = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            let part = field.name().unwrap_or_default().to_string();
            match part.as_str() {
                "file" if stored.is_none() => {
                    stored = Some(storage.save_field(ROOM_FILES_DIR, field).await?);
                }
                "name" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    display_name = Some(text.trim().chars().take(MAX_FILE_NAME_LEN).collect());
                }
                _ => {}
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(e) = read {
        if let Some(stored) = &stored {
            storage.discard(stored).await;
        }
        return Err(e);
    }

    let mut stored = stored.ok_or_else(|| AppError::field("file", "No file was submitted."))?;
    if let Some(name) = display_name.filter(|n| !n.is_empty()) {
        stored.name = name;
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{header, Request},
    };

    const BOUNDARY: &str = "upload-boundary";

    fn multipart(body: String) -> Request<Body> {
        Request::post("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn file_part(file_name: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {content}\r\n"
        )
    }

    async fn stored_files(storage: &FileStorage) -> usize {
        let Ok(mut entries) = tokio::fs::read_dir(storage.root().join(ROOM_FILES_DIR)).await else {
            return 0;
        };
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }

    #[tokio::test]
    async fn test_name_part_overrides_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let body = format!(
            "{}--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\r\n  \
             Quarterly plan  \r\n\
             --{BOUNDARY}--\r\n",
            file_part("plan.txt", "the plan")
        );
        let form = Multipart::from_request(multipart(body), &()).await.unwrap();

        let stored = read_upload_form(&storage, form).await.unwrap();
        assert_eq!(stored.name, "Quarterly plan");
        assert_eq!(stored.size_bytes, 8);
        assert_eq!(stored_files(&storage).await, 1);
    }

    #[tokio::test]
    async fn test_form_without_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\r\n\
             nothing\r\n\
             --{BOUNDARY}--\r\n"
        );
        let form = Multipart::from_request(multipart(body), &()).await.unwrap();

        let result = read_upload_form(&storage, form).await;
        assert!(matches!(result, Err(AppError::FieldValidation { .. })));
    }

    #[tokio::test]
    async fn test_broken_later_part_removes_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        // The `name` part is cut off before its closing boundary.
        let body = format!(
            "{}--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\r\n\
             unterminated",
            file_part("plan.txt", "the plan")
        );
        let form = Multipart::from_request(multipart(body), &()).await.unwrap();

        let result = read_upload_form(&storage, form).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(stored_files(&storage).await, 0);
    }
}
