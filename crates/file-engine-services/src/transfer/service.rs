//! Transfer service
//!
//! Coordinates the object store and the metadata store for every file operation:
//! validate → check uniqueness → stream bytes → persist metadata (or compensate).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use file_engine_core::constants::DEFAULT_CONTENT_TYPE;
use file_engine_core::validation::{
    validate_content_type, validate_upload, validate_upload_request,
};
use file_engine_core::{
    generate_unique_object_name, AllowAllPermissions, AppError, DownloadUrl, FileListPage,
    FileRecord, FileStatus, NewFileRecord, PermissionHook, UploadUrl,
};
use file_engine_db::FileMetadataStore;
use file_engine_storage::{ByteReader, Storage};
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use super::types::{FileDownload, TransferSettings};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Clamp list pagination: `page < 1` becomes 1, a page size outside `1..=100` becomes 20.
///
/// `page` is also capped so that `(page - 1) * page_size` fits in an `i64` offset.
pub fn normalize_pagination(page: i64, page_size: i64) -> (i64, i64) {
    let page_size = if (1..=MAX_PAGE_SIZE).contains(&page_size) {
        page_size
    } else {
        DEFAULT_PAGE_SIZE
    };
    let page = page.clamp(1, i64::MAX / page_size);
    (page, page_size)
}

/// Decode `%2F` in the path part of a presigned URL. The query string carries the
/// signature and is returned untouched.
pub fn normalize_presigned_url(url: &str) -> String {
    let (path, query) = match url.find('?') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    };
    format!("{}{}", path.replace("%2F", "/").replace("%2f", "/"), query)
}

fn content_type_or_default(content_type: &str) -> String {
    let trimmed = content_type.trim();
    if trimmed.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        trimmed.to_string()
    }
}

fn ttl_seconds(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}

/// Transfer orchestrator
///
/// Holds only shared handles and immutable settings, so it is cheap to clone into handlers.
#[derive(Clone)]
pub struct TransferService {
    storage: Arc<dyn Storage>,
    metadata: Arc<dyn FileMetadataStore>,
    permissions: Arc<dyn PermissionHook>,
    settings: TransferSettings,
}

impl TransferService {
    pub fn new(
        storage: Arc<dyn Storage>,
        metadata: Arc<dyn FileMetadataStore>,
        settings: TransferSettings,
    ) -> Self {
        Self {
            storage,
            metadata,
            permissions: Arc::new(AllowAllPermissions),
            settings,
        }
    }

    /// Replace the default allow-all permission hook
    pub fn with_permission_hook(mut self, hook: Arc<dyn PermissionHook>) -> Self {
        self.permissions = hook;
        self
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Stream a file into the default container and record it.
    ///
    /// `size` is the declared length. When it is unknown the reader is capped and an
    /// overrun is rejected after the fact.
    #[tracing::instrument(skip(self, reader), fields(operation = "upload", file_name = %name))]
    pub async fn upload(
        &self,
        reader: ByteReader,
        name: &str,
        size: Option<u64>,
        content_type: &str,
    ) -> Result<FileRecord, AppError> {
        validate_upload(name, size.unwrap_or(0))?;
        validate_content_type(content_type)?;

        if self.metadata.get_by_name(name).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "File {} already exists",
                name
            )));
        }

        let container = self.settings.default_container.clone();
        let content_type = content_type_or_default(content_type);
        let limit = self.settings.stream_limit;
        let capped: ByteReader = Box::pin(reader.take(limit.saturating_add(1)));

        let start = std::time::Instant::now();
        let written = self
            .storage
            .upload(&container, name, capped, size, &content_type)
            .await?;

        if written > limit {
            tracing::warn!(
                container = %container,
                key = %name,
                limit,
                "Upload stream exceeded size limit, removing object"
            );
            compensate(self.storage.as_ref(), &container, name).await;
            return Err(AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size {}",
                limit
            )));
        }

        let record = NewFileRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            container_id: container.clone(),
            object_key: name.to_string(),
            size: i64::try_from(written).unwrap_or(i64::MAX),
            content_type,
            icon: String::new(),
            status: FileStatus::Committed,
        };

        // The commit-or-compensate step runs detached so a dropped caller cannot skip it.
        let metadata = self.metadata.clone();
        let storage = self.storage.clone();
        let commit = tokio::spawn(async move {
            match metadata.create(&record).await {
                Ok(created) => Ok(created),
                Err(e) => {
                    if matches!(e, AppError::AlreadyExists(_))
                        && owns_key(metadata.as_ref(), &record).await
                    {
                        tracing::warn!(
                            container = %record.container_id,
                            key = %record.object_key,
                            "Name taken by a concurrent upload of the same key, keeping object"
                        );
                        return Err(e);
                    }
                    tracing::warn!(
                        error = %e,
                        container = %record.container_id,
                        key = %record.object_key,
                        "Metadata insert failed, removing uploaded object"
                    );
                    compensate(storage.as_ref(), &record.container_id, &record.object_key).await;
                    Err(e)
                }
            }
        });

        let created = commit
            .await
            .map_err(|e| AppError::Internal(format!("Upload commit task failed: {}", e)))??;

        tracing::info!(
            file_id = %created.id,
            container = %created.container_id,
            size_bytes = created.size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File uploaded"
        );

        Ok(created)
    }

    /// Open a file for streaming download.
    #[tracing::instrument(skip(self), fields(operation = "download", file_id = %id))]
    pub async fn download(&self, id: Uuid) -> Result<FileDownload, AppError> {
        let file = self.find(id).await?;
        self.require_object(&file).await?;

        let stream = self
            .storage
            .download(&file.container_id, &file.object_key)
            .await?;

        Ok(FileDownload { file, stream })
    }

    /// Reserve a unique object key and hand back a presigned PUT URL for it.
    ///
    /// The record is created `pending`; it turns `committed` once the reconcile sweep
    /// sees the object.
    #[tracing::instrument(skip(self), fields(operation = "generate_upload_url", file_name = %filename))]
    pub async fn generate_upload_url(
        &self,
        filename: &str,
        content_type: &str,
        size: u64,
    ) -> Result<UploadUrl, AppError> {
        validate_upload_request(filename, size, self.settings.presigned_extension_check)?;
        validate_content_type(content_type)?;

        let container = &self.settings.default_container;
        let key = generate_unique_object_name(filename);
        let ttl = self.settings.upload_url_ttl;

        let url = self.storage.presign_upload(container, &key, ttl).await?;
        let url = normalize_presigned_url(&url);

        let record = self
            .metadata
            .create(&NewFileRecord {
                id: Uuid::new_v4(),
                name: filename.to_string(),
                container_id: container.clone(),
                object_key: key,
                size: i64::try_from(size).unwrap_or(i64::MAX),
                content_type: content_type_or_default(content_type),
                icon: String::new(),
                status: FileStatus::Pending,
            })
            .await?;

        tracing::info!(
            file_id = %record.id,
            container = %record.container_id,
            key = %record.object_key,
            "Presigned upload URL issued"
        );

        let expires_in = ttl_seconds(ttl);
        Ok(UploadUrl {
            id: record.id,
            url,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
            expires_in,
        })
    }

    /// Presigned GET URL for an existing file.
    #[tracing::instrument(skip(self), fields(operation = "generate_download_url", file_id = %id))]
    pub async fn generate_download_url(&self, id: Uuid) -> Result<DownloadUrl, AppError> {
        self.permissions.check_download(id).await?;

        let file = self.find(id).await?;
        self.require_object(&file).await?;

        let ttl = self.settings.download_url_ttl;
        let url = self
            .storage
            .presign_download(&file.container_id, &file.object_key, ttl)
            .await?;

        let expires_in = ttl_seconds(ttl);
        Ok(DownloadUrl {
            url,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
            expires_in,
            file_info: file,
            direct_download: true,
        })
    }

    /// Delete the object, then the record.
    ///
    /// An object that is already gone counts as deleted. If the object delete fails the
    /// record is left in place.
    #[tracing::instrument(skip(self), fields(operation = "delete", file_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let file = self.find(id).await?;

        match self
            .storage
            .delete(&file.container_id, &file.object_key)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(
                    container = %file.container_id,
                    key = %file.object_key,
                    "Object already gone"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    container = %file.container_id,
                    key = %file.object_key,
                    "Failed to delete object, keeping metadata"
                );
                return Err(e.into());
            }
        }

        if let Err(e) = self.metadata.delete(id).await {
            tracing::error!(
                error = %e,
                file_id = %id,
                "Object deleted but metadata delete failed"
            );
            return Err(e);
        }

        tracing::info!(file_id = %id, "File deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(operation = "get_meta", file_id = %id))]
    pub async fn get_meta(&self, id: Uuid) -> Result<FileRecord, AppError> {
        self.find(id).await
    }

    /// One page of records, newest first. `container` defaults to the configured one.
    #[tracing::instrument(skip(self), fields(operation = "get_list"))]
    pub async fn get_list(
        &self,
        container: Option<&str>,
        page: i64,
        page_size: i64,
    ) -> Result<FileListPage, AppError> {
        let (page, page_size) = normalize_pagination(page, page_size);
        let container = container
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.settings.default_container);

        let (files, total) = self.metadata.list(container, page, page_size).await?;

        Ok(FileListPage {
            files,
            total,
            page,
            page_size,
        })
    }

    async fn find(&self, id: Uuid) -> Result<FileRecord, AppError> {
        self.metadata
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))
    }

    async fn require_object(&self, file: &FileRecord) -> Result<(), AppError> {
        if self
            .storage
            .exists(&file.container_id, &file.object_key)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Object for file {} not found",
                file.id
            )))
        }
    }
}

/// Whether the record currently holding `record.name` points at the same object.
/// A lookup failure counts as "no", so compensation still runs.
async fn owns_key(metadata: &dyn FileMetadataStore, record: &NewFileRecord) -> bool {
    matches!(
        metadata.get_by_name(&record.name).await,
        Ok(Some(existing))
            if existing.container_id == record.container_id
                && existing.object_key == record.object_key
    )
}

/// Best-effort removal of an object written by a failed upload. Never escalates.
async fn compensate(storage: &dyn Storage, container: &str, key: &str) {
    if let Err(e) = storage.delete(container, key).await {
        tracing::error!(
            error = %e,
            container = %container,
            key = %key,
            "Compensating delete failed, object is orphaned"
        );
    }
}
