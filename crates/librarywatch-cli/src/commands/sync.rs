use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use library_sync_config::{Config, PathManager};

pub async fn run_sync(config: Config, paths: &PathManager, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let reconciler = super::build_reconciler(&config, paths)?;

    match reconciler.reconcile().await {
        Ok(stats) => {
            output.stats(&stats);
            Ok(())
        }
        Err(e) => {
            output.error(format!("Sync failed: {}", e));
            Err(eyre!("Sync operation failed: {}", e))
        }
    }
}
