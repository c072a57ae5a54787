pub mod config;
pub mod serve;
pub mod sync;

use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use library_sync_config::{Config, PathManager};
use library_sync_core::{JsonStore, NoopHooks, ReconcileSettings, Reconciler};
use library_sync_sources::EmbyClient;
use std::sync::Arc;
use tracing::debug;

/// Validate `config`, open the store and wire an Emby-backed reconciler.
pub fn build_reconciler(config: &Config, paths: &PathManager) -> Result<Arc<Reconciler>> {
    config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;

    let store_path = config.store_path(paths);
    debug!(store = %store_path.display(), "Opening store");
    let store = JsonStore::open(&store_path)
        .wrap_err_with(|| format!("Failed to open store at {}", store_path.display()))?
        .into_shared();

    let client = EmbyClient::from_config(&config.emby)
        .map_err(|e| eyre!("Failed to create Emby client: {}", e))?;

    let forget_after = config
        .sync
        .forget_after()
        .map_err(|e| eyre!("Invalid sync.forget_time: {}", e))?;
    let forget_after = chrono::Duration::from_std(forget_after)
        .wrap_err("sync.forget_time is out of range")?;

    Ok(Arc::new(Reconciler::new(
        Arc::new(client),
        store,
        Arc::new(NoopHooks),
        ReconcileSettings::new(forget_after),
    )))
}
