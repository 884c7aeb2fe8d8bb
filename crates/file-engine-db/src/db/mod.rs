//! Database repositories for data access layer
//
// File metadata repository and its port
pub mod file;

pub use file::{FileMetadataStore, FileRepository};

/// Migrations under the workspace `migrations/` directory, embedded at build time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
