//! Application state shared by all handlers.

use std::sync::Arc;

use file_engine_core::{Config, OperationTimeouts};
use file_engine_services::{FileMetadataStore, Storage, TransferService};

#[derive(Clone)]
pub struct AppState {
    pub transfer: TransferService,
    /// Direct port handles, used by the readiness probe
    pub metadata: Arc<dyn FileMetadataStore>,
    pub storage: Arc<dyn Storage>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        transfer: TransferService,
        metadata: Arc<dyn FileMetadataStore>,
        storage: Arc<dyn Storage>,
        config: Config,
    ) -> Self {
        Self {
            transfer,
            metadata,
            storage,
            config,
        }
    }

    pub fn timeouts(&self) -> &OperationTimeouts {
        self.config.timeouts()
    }
}
