#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use file_engine_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config.s3_region().to_string();
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(region, endpoint)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use file_engine_core::config::{FileEngineConfig, OperationTimeouts};
    use std::time::Duration;

    fn local_config(path: Option<String>) -> Config {
        Config(Box::new(FileEngineConfig {
            environment: "development".to_string(),
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            log_format: "text".to_string(),
            database_url: "postgresql://localhost/file_engine".to_string(),
            db_max_connections: 5,
            db_timeout_seconds: 5,
            storage_backend: StorageBackend::Local,
            default_container: "file-engine".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            local_storage_path: path,
            local_storage_base_url: Some("http://localhost:4000/files".to_string()),
            upload_url_ttl: Duration::from_secs(900),
            download_url_ttl: Duration::from_secs(3600),
            presigned_extension_check: false,
            pending_sweep_interval: Duration::ZERO,
            pending_sweep_grace: Duration::from_secs(300),
            timeouts: OperationTimeouts::default(),
        }))
    }

    #[tokio::test]
    async fn test_create_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(Some(dir.path().display().to_string()));

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn test_local_storage_requires_path() {
        let result = create_storage(&local_config(None)).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
