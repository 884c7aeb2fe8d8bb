//! File Engine Services Layer
//!
//! This crate is the business service layer: it hosts the transfer orchestrator that
//! coordinates the object store and the metadata store, and the reconcile sweep for
//! provisional records. Keep coordination here; keep thin HTTP handling in file-engine-api.

pub mod reconcile;
pub mod transfer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use file_engine_db::FileMetadataStore;
pub use file_engine_storage::{
    create_storage, ByteReader, ByteStream, Storage, StorageBackend, StorageError, StorageResult,
};
pub use reconcile::{ProvisionalSweeper, SweepReport};
pub use transfer::{FileDownload, TransferService, TransferSettings};
