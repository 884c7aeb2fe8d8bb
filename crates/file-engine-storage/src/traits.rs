//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use file_engine_core::AppError;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object {} not found", key)),
            StorageError::AlreadyExists(key) => {
                AppError::AlreadyExists(format!("Object {} already exists", key))
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Source of bytes for an upload. Consumed until EOF.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Unbuffered download body. Dropping it releases the backend resource.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Object attributes returned by [`Storage::stat`]
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// The transfer service works against it without knowing which backend is configured.
///
/// Every method that addresses an object creates the container when it is missing,
/// except `delete`, `exists` and `stat`, which treat a missing container as a missing object.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `reader` into `(container, key)` and return the number of bytes written.
    ///
    /// Create-only: an existing object is never replaced and the call fails with
    /// `AlreadyExists` instead. `size` is the declared length, if known. Backends may use
    /// it as a hint but the returned count is what was actually read.
    async fn upload(
        &self,
        container: &str,
        key: &str,
        reader: ByteReader,
        size: Option<u64>,
        content_type: &str,
    ) -> StorageResult<u64>;

    /// Open an object for streaming download
    async fn download(&self, container: &str, key: &str) -> StorageResult<ByteStream>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, container: &str, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, container: &str, key: &str) -> StorageResult<bool>;

    /// Fetch object attributes, `NotFound` if missing
    async fn stat(&self, container: &str, key: &str) -> StorageResult<ObjectInfo>;

    /// Generate a presigned PUT URL for direct uploads.
    ///
    /// Only supported by S3 backends; other backends return a `ConfigError`.
    async fn presign_upload(&self, container: &str, key: &str, ttl: Duration)
        -> StorageResult<String>;

    /// Generate a presigned/temporary URL for direct access (GET)
    async fn presign_download(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<String>;

    /// Create the container if it does not exist yet
    async fn ensure_container(&self, container: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;
    use file_engine_core::ErrorKind;

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err: AppError = StorageError::NotFound("files/a.txt".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_already_exists_maps_to_conflict() {
        let err: AppError = StorageError::AlreadyExists("files/a.txt".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_other_errors_map_to_storage_failure() {
        for err in [
            StorageError::UploadFailed("x".into()),
            StorageError::DeleteFailed("x".into()),
            StorageError::BackendError("x".into()),
            StorageError::InvalidKey("x".into()),
        ] {
            let app: AppError = err.into();
            assert_eq!(app.kind(), ErrorKind::StorageFailure);
        }
    }
}
