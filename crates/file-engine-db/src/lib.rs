//! File Engine metadata store
//!
//! PostgreSQL implementation of the file metadata port, plus the embedded migrations.

pub mod db;

pub use db::{FileMetadataStore, FileRepository, MIGRATOR};
