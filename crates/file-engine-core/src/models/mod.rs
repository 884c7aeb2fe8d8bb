//! Data models for the application
//!
//! `file` holds the persisted metadata record; `transfer` holds the short-lived
//! values handed back to callers of the presigned URL operations.

mod file;
mod transfer;

pub use file::*;
pub use transfer::*;
