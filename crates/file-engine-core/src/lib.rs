//! File Engine Core Library
//!
//! This crate provides the domain models, error types, configuration, filename validation
//! and object naming shared across all file-engine components.

pub mod config;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod models;
pub mod naming;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, FileEngineConfig, OperationTimeouts};
pub use error::{AppError, ErrorKind, ErrorMetadata, LogLevel};
pub use hooks::{AllowAllPermissions, PermissionHook};
pub use models::{
    DownloadUrl, FileListPage, FileRecord, FileStatus, NewFileRecord, UploadUrl, UploadUrlRequest,
};
pub use naming::generate_unique_object_name;
pub use storage_types::StorageBackend;
pub use validation::ValidationError;
