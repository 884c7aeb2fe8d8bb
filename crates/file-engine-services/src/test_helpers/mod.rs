//! In-memory implementations of the storage and metadata ports
//!
//! Used by the service tests and, through the `test-helpers` feature, by the API
//! integration tests. Each mock can be told to fail specific operations.

mod mock_repositories;
mod mock_storage;

pub use mock_repositories::MockFileRepository;
pub use mock_storage::MockStorage;

use file_engine_storage::ByteReader;

/// Wrap bytes as an upload reader
pub fn reader(data: &[u8]) -> ByteReader {
    Box::pin(std::io::Cursor::new(data.to_vec()))
}
