//! File Engine Storage Library
//!
//! This crate provides the object store port and its implementations.
//! It includes the Storage trait and implementations for S3 (and S3-compatible
//! providers such as MinIO) and the local filesystem.
//!
//! # Addressing
//!
//! Every object is addressed by a `(container, key)` pair. On S3 a container is a bucket;
//! on the local backend it is a directory under the configured base path. Backends create
//! a missing container on first use.
//!
//! Keys must not contain `..` segments or a leading `/`. Validation is centralized in the
//! `keys` module so all backends agree on what is addressable.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use file_engine_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteReader, ByteStream, ObjectInfo, Storage, StorageError, StorageResult};
