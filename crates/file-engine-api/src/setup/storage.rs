//! Storage setup and initialization

use std::sync::Arc;

use anyhow::{Context, Result};
use file_engine_core::Config;
use file_engine_services::{create_storage, Storage};

/// Build the configured backend and make sure the default container exists.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage backend...");
    let storage = create_storage(config)
        .await
        .context("Failed to create storage backend")?;

    storage
        .ensure_container(config.default_container())
        .await
        .with_context(|| {
            format!(
                "Failed to prepare default container {}",
                config.default_container()
            )
        })?;

    tracing::info!(
        backend = ?storage.backend_type(),
        container = %config.default_container(),
        "Storage backend initialized successfully"
    );

    Ok(storage)
}
