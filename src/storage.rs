use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::multipart::Field;
use futures::{Stream, StreamExt, TryStreamExt};
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Directory for room file uploads, relative to the media root.
pub const ROOM_FILES_DIR: &str = "room_files";
/// Directory for chat attachments, relative to the media root.
pub const MESSAGE_MEDIA_DIR: &str = "media";
/// URL prefix the media root is served under.
pub const MEDIA_URL: &str = "/media";

const MAX_NAME_LEN: usize = 100;
/// Width of the `room_files.name` column.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// A file written under the media root.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    /// Path relative to the media root, always `/`-separated.
    pub relative_path: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
}

#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn absolute(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Streams a multipart file field to disk.
    pub async fn save_field(&self, dir: &str, field: Field<'_>) -> Result<StoredFile> {
        let name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let chunks = field.map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)));

        self.save_stream(dir, &name, content_type, chunks).await
    }

    pub async fn save_stream<S>(
        &self,
        dir: &str,
        original_name: &str,
        content_type: Option<String>,
        chunks: S,
    ) -> Result<StoredFile>
    where
        S: Stream<Item = Result<Bytes>>,
    {
        let file_name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_file_name(original_name));
        let relative_path = format!("{}/{}", dir, file_name);
        let path = self.absolute(&relative_path);

        fs::create_dir_all(self.root.join(dir)).await?;
        let mut file = fs::File::create(&path).await?;

        let written = write_chunks(&mut file, chunks).await;
        let size_bytes = match written {
            Ok(size) => size,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(e);
            }
        };

        tracing::debug!("Stored {} ({} bytes)", relative_path, size_bytes);
        Ok(StoredFile {
            name: original_name.chars().take(MAX_FILE_NAME_LEN).collect(),
            relative_path,
            content_type,
            size_bytes,
        })
    }

    /// Best-effort removal of a file that will not be referenced by any row.
    pub async fn discard(&self, stored: &StoredFile) {
        if let Err(e) = self.remove(&stored.relative_path).await {
            tracing::error!("Could not remove orphaned file {}: {}", stored.relative_path, e);
        }
    }

    /// Deleting a file that is already gone is not an error.
    pub async fn remove(&self, relative_path: &str) -> Result<()> {
        match fs::remove_file(self.absolute(relative_path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_chunks<S>(file: &mut fs::File, chunks: S) -> Result<i64>
where
    S: Stream<Item = Result<Bytes>>,
{
    futures::pin_mut!(chunks);
    let mut size: i64 = 0;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        size += chunk.len() as i64;
    }

    file.flush().await?;
    Ok(size)
}

/// Keeps the last path component and only `[A-Za-z0-9._-]`, everything else
/// becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn media_url(relative_path: &str) -> String {
    format!("{}/{}", MEDIA_URL, relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\my file (1).txt"), "my_file__1_.txt");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("...."), "file");
    }

    #[test]
    fn test_media_url() {
        assert_eq!(media_url("room_files/ab_x.txt"), "/media/room_files/ab_x.txt");
    }

    #[tokio::test]
    async fn test_save_stream_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ]);
        let stored = storage
            .save_stream(ROOM_FILES_DIR, "notes.txt", Some("text/plain".into()), chunks)
            .await
            .unwrap();

        assert_eq!(stored.name, "notes.txt");
        assert_eq!(stored.size_bytes, 11);
        assert!(stored.relative_path.starts_with("room_files/"));
        assert!(stored.relative_path.ends_with("_notes.txt"));

        let content = tokio::fs::read(storage.absolute(&stored.relative_path)).await.unwrap();
        assert_eq!(content, b"hello world");
    }

    #[tokio::test]
    async fn test_long_original_name_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let long_name = format!("{}.txt", "é".repeat(300));

        let stored = storage
            .save_stream(ROOM_FILES_DIR, &long_name, None, stream::iter(vec![Ok(Bytes::from_static(b"x"))]))
            .await
            .unwrap();

        assert_eq!(stored.name.chars().count(), MAX_FILE_NAME_LEN);
        assert!(long_name.starts_with(&stored.name));
        assert!(storage.absolute(&stored.relative_path).exists());
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(AppError::BadRequest("connection reset".into())),
        ]);
        let result = storage.save_stream(ROOM_FILES_DIR, "a.bin", None, chunks).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let mut entries = tokio::fs::read_dir(dir.path().join(ROOM_FILES_DIR)).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let stored = storage
            .save_stream(MESSAGE_MEDIA_DIR, "pic.png", None, stream::iter(vec![Ok(Bytes::from_static(b"x"))]))
            .await
            .unwrap();

        storage.remove(&stored.relative_path).await.unwrap();
        assert!(!storage.absolute(&stored.relative_path).exists());
        storage.remove(&stored.relative_path).await.unwrap();
    }
}
