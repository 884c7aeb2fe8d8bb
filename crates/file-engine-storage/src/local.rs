use crate::keys;
use crate::traits::{ByteReader, ByteStream, ObjectInfo, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use file_engine_core::constants::content_type_for;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tokio::fs;
use uuid::Uuid;

/// Local filesystem storage implementation
///
/// A container is a directory directly below `base_path`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for containers (e.g., "/var/lib/file-engine")
    /// * `base_url` - Base URL the files are served from (e.g., "http://localhost:4000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let base_path = base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    fn container_path(&self, container: &str) -> StorageResult<PathBuf> {
        keys::validate_container(container)?;
        Ok(self.base_path.join(container))
    }

    /// Convert `(container, key)` to a filesystem path with security validation
    fn object_path(&self, container: &str, key: &str) -> StorageResult<PathBuf> {
        keys::validate(container, key)?;
        let path = self.base_path.join(container).join(key);

        // Symlinks inside the tree could still point outside of it.
        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&self.base_path).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn generate_url(&self, container: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            container,
            key
        )
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_object(
        &self,
        path: &Path,
        mut reader: ByteReader,
    ) -> StorageResult<u64> {
        // Write beside the target and link into place, so readers never observe a partial
        // object and an existing object is never replaced.
        let partial = PartialFile(path.with_file_name(format!(
            ".{}.{}.partial",
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("object"),
            Uuid::new_v4().simple()
        )));

        let mut file = fs::File::create(&partial.0).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                partial.0.display(),
                e
            ))
        })?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;
        drop(file);

        fs::hard_link(&partial.0, path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                StorageError::AlreadyExists(path.display().to_string())
            } else {
                StorageError::UploadFailed(format!(
                    "Failed to move file into place {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        Ok(bytes_copied)
    }
}

/// Staging file of an in-flight upload. Removed on drop, which covers success (the
/// object is linked into place by then), errors and a cancelled upload future.
struct PartialFile(PathBuf);

impl Drop for PartialFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    error = %e,
                    path = %self.0.display(),
                    "Failed to remove partial upload file"
                );
            }
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        container: &str,
        key: &str,
        reader: ByteReader,
        _size: Option<u64>,
        _content_type: &str,
    ) -> StorageResult<u64> {
        self.ensure_container(container).await?;
        let path = self.object_path(container, key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let bytes_copied = self.write_object(&path, reader).await.map_err(|e| {
            tracing::error!(
                error = %e,
                container = %container,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Local storage upload failed"
            );
            e
        })?;

        tracing::info!(
            path = %path.display(),
            container = %container,
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(bytes_copied)
    }

    async fn download(&self, container: &str, key: &str) -> StorageResult<ByteStream> {
        let path = self.object_path(container, key)?;
        let start = std::time::Instant::now();

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(format!("{}/{}", container, key)));
            }
            Err(e) => {
                return Err(StorageError::DownloadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let container = container.to_string();
        let key = key.to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    error = %e,
                    container = %container,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream download error"
                );
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, container: &str, key: &str) -> StorageResult<()> {
        let path = self.object_path(container, key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            container = %container,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, container: &str, key: &str) -> StorageResult<bool> {
        let path = self.object_path(container, key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn stat(&self, container: &str, key: &str) -> StorageResult<ObjectInfo> {
        let path = self.object_path(container, key)?;
        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(StorageError::NotFound(format!("{}/{}", container, key))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(format!("{}/{}", container, key)));
            }
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        };

        let modified = meta.modified()?;
        let nanos = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        Ok(ObjectInfo {
            key: key.to_string(),
            size: meta.len(),
            content_type: content_type_for(key).to_string(),
            last_modified: DateTime::<Utc>::from(modified),
            etag: Some(format!("{:x}-{:x}", nanos, meta.len())),
        })
    }

    async fn presign_upload(
        &self,
        _container: &str,
        _key: &str,
        _ttl: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::ConfigError(
            "Presigned uploads require an S3-compatible storage backend".to_string(),
        ))
    }

    async fn presign_download(
        &self,
        container: &str,
        key: &str,
        _ttl: Duration,
    ) -> StorageResult<String> {
        self.object_path(container, key)?;
        Ok(self.generate_url(container, key))
    }

    async fn ensure_container(&self, container: &str) -> StorageResult<()> {
        let path = self.container_path(container)?;
        fs::create_dir_all(&path).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Failed to create container {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    const BASE_URL: &str = "http://localhost:4000/files";

    fn reader(data: &[u8]) -> ByteReader {
        Box::pin(std::io::Cursor::new(data.to_vec()))
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_upload_creates_container_and_round_trips() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        let data = b"stream test data";
        let written = storage
            .upload("uploads", "report.txt", reader(data), None, "text/plain")
            .await
            .unwrap();

        assert_eq!(written, data.len() as u64);
        assert!(dir.path().join("uploads").is_dir());

        let stream = storage.download("uploads", "report.txt").await.unwrap();
        assert_eq!(collect(stream).await, data);
    }

    #[tokio::test]
    async fn test_upload_never_replaces_existing_object() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        storage
            .upload("uploads", "a.txt", reader(b"first"), None, "text/plain")
            .await
            .unwrap();
        let result = storage
            .upload("uploads", "a.txt", reader(b"second"), None, "text/plain")
            .await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        let stream = storage.download("uploads", "a.txt").await.unwrap();
        assert_eq!(collect(stream).await, b"first");
        assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_upload_leaves_no_partial_file() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        // The writer half stays open, so the reader never reaches EOF
        let (mut client, server) = tokio::io::duplex(64);
        client.write_all(b"first chunk").await.unwrap();

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            storage.upload("uploads", "slow.txt", Box::pin(server), None, "text/plain"),
        )
        .await;
        assert!(result.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
        assert!(!storage.exists("uploads", "slow.txt").await.unwrap());
        drop(client);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        let result = storage.download("uploads", "../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("uploads", "../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("uploads", "/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.ensure_container("..").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        storage
            .upload("uploads", "gone.txt", reader(b"x"), Some(1), "text/plain")
            .await
            .unwrap();

        storage.delete("uploads", "gone.txt").await.unwrap();
        assert!(!storage.exists("uploads", "gone.txt").await.unwrap());
        storage.delete("uploads", "gone.txt").await.unwrap();
        storage.delete("missing-container", "never.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        let result = storage.download("uploads", "nonexistent.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stat() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        storage
            .upload("uploads", "photo.PNG", reader(b"12345"), None, "")
            .await
            .unwrap();

        let info = storage.stat("uploads", "photo.PNG").await.unwrap();
        assert_eq!(info.key, "photo.PNG");
        assert_eq!(info.size, 5);
        assert_eq!(info.content_type, "image/png");
        assert!(info.etag.is_some());

        let missing = storage.stat("uploads", "nope.png").await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_presigned_urls() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), format!("{}/", BASE_URL))
            .await
            .unwrap();

        let url = storage
            .presign_download("uploads", "a.txt", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:4000/files/uploads/a.txt");

        let result = storage
            .presign_upload("uploads", "a.txt", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
