//! Service wiring

use std::sync::Arc;

use file_engine_core::Config;
use file_engine_db::FileRepository;
use file_engine_services::{
    FileMetadataStore, ProvisionalSweeper, Storage, TransferService, TransferSettings,
};
use sqlx::PgPool;

use crate::state::AppState;

/// Wire the ports into the transfer service and start background tasks.
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Arc<AppState> {
    let metadata: Arc<dyn FileMetadataStore> = Arc::new(FileRepository::new(pool));

    let settings = TransferSettings::from_config(config);
    let transfer = TransferService::new(storage.clone(), metadata.clone(), settings);

    start_provisional_sweep(config, storage.clone(), metadata.clone());

    Arc::new(AppState::new(transfer, metadata, storage, config.clone()))
}

/// Presigned uploads are settled once their URL has expired plus a grace period.
fn start_provisional_sweep(
    config: &Config,
    storage: Arc<dyn Storage>,
    metadata: Arc<dyn FileMetadataStore>,
) {
    let every = config.pending_sweep_interval();
    if every.is_zero() {
        tracing::info!("Provisional record sweep disabled");
        return;
    }

    let older_than = config.upload_url_ttl() + config.pending_sweep_grace();
    let sweeper = Arc::new(ProvisionalSweeper::new(storage, metadata));
    // Runs until the process exits
    let _handle = sweeper.spawn(every, older_than);

    tracing::info!(
        interval_secs = every.as_secs(),
        older_than_secs = older_than.as_secs(),
        "Provisional record sweep started"
    );
}
