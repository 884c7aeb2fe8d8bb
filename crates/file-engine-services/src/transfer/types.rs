//! Types used by the transfer service

use std::fmt;
use std::time::Duration;

use file_engine_core::constants::MAX_FILE_SIZE;
use file_engine_core::{Config, FileRecord};
use file_engine_storage::ByteStream;

/// Immutable settings the transfer service is built with
#[derive(Clone, Debug)]
pub struct TransferSettings {
    /// Container every upload lands in and the default list scope
    pub default_container: String,
    pub upload_url_ttl: Duration,
    pub download_url_ttl: Duration,
    /// Apply the extension allow-list to presigned upload requests too
    pub presigned_extension_check: bool,
    /// Hard cap on bytes read from an upload stream
    pub stream_limit: u64,
}

impl TransferSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_container: config.default_container().to_string(),
            upload_url_ttl: config.upload_url_ttl(),
            download_url_ttl: config.download_url_ttl(),
            presigned_extension_check: config.presigned_extension_check(),
            stream_limit: MAX_FILE_SIZE,
        }
    }
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            default_container: "file-engine".to_string(),
            upload_url_ttl: Duration::from_secs(15 * 60),
            download_url_ttl: Duration::from_secs(60 * 60),
            presigned_extension_check: false,
            stream_limit: MAX_FILE_SIZE,
        }
    }
}

/// A metadata record bound to an open, unbuffered object stream
pub struct FileDownload {
    pub file: FileRecord,
    pub stream: ByteStream,
}

impl fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDownload")
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}
