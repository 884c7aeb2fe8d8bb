//! Transfer orchestration
//!
//! Every operation that touches both the object store and the metadata store goes through
//! [`TransferService`]. Writes are ordered so that a failure leaves at most one orphan,
//! and the upload path compensates when the metadata insert fails.

mod service;
mod types;

pub use service::{normalize_pagination, normalize_presigned_url, TransferService};
pub use types::{FileDownload, TransferSettings};
