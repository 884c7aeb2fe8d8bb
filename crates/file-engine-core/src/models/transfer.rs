use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::FileRecord;

/// Request for a presigned upload URL
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UploadUrlRequest {
    /// Original filename
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    /// Content type (MIME type)
    #[serde(default)]
    pub content_type: String,
    /// Declared file size in bytes
    pub size: u64,
}

/// Presigned upload URL handed to the client
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadUrl {
    /// ID of the provisional file record
    pub id: Uuid,
    pub url: String,
    pub expires_at: DateTime<Utc>,
    /// Seconds until expiry
    pub expires_in: i64,
}

/// Presigned download URL handed to the client
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DownloadUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
    /// Seconds until expiry
    pub expires_in: i64,
    pub file_info: FileRecord,
    /// The URL can be fetched directly from the object store
    pub direct_download: bool,
}
