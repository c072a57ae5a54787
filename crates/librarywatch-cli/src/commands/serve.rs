use crate::output::Output;
use crate::server::{self, AppState};
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use library_sync_config::{parse_duration, Config, PathManager};
use library_sync_core::Reconciler;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Overrides `sync.run_on_startup` when set
    pub startup_sync: Option<bool>,
    /// Overrides `sync.interval` when set
    pub interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Schedule {
    interval: Duration,
    run_on_startup: bool,
}

fn resolve_schedule(config: &Config, options: &ServeOptions) -> Result<Schedule> {
    let interval_text = options
        .interval
        .as_deref()
        .unwrap_or(&config.sync.interval);
    let interval = parse_duration(interval_text)
        .map_err(|e| eyre!("Invalid sync interval {:?}: {}", interval_text, e))?;
    if interval.is_zero() {
        return Err(eyre!("Sync interval must be greater than zero"));
    }

    Ok(Schedule {
        interval,
        run_on_startup: options.startup_sync.unwrap_or(config.sync.run_on_startup),
    })
}

pub async fn run_serve(
    config: Config,
    paths: &PathManager,
    options: ServeOptions,
    output: &Output,
) -> Result<()> {
    let schedule = resolve_schedule(&config, &options)?;
    let reconciler = super::build_reconciler(&config, paths)?;

    info!("Starting librarywatch_v{}", env!("CARGO_PKG_VERSION"));

    let address = format!("{}:{}", config.server.bind, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .wrap_err_with(|| format!("Failed to bind HTTP listener on {}", address))?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let state = AppState {
        store: reconciler.store().clone(),
    };
    let server_handle = tokio::spawn(server::run(listener, state, async move {
        let _ = shutdown_rx.await;
    }));
    output.info(format!("Listening for webhooks on {}", address));

    let startup_pass = schedule
        .run_on_startup
        .then(|| spawn_startup_pass(reconciler.clone()));

    let mut scheduler = JobScheduler::new()
        .await
        .map_err(|e| eyre!("Failed to create scheduler: {}", e))?;
    let job_reconciler = reconciler.clone();
    let job = Job::new_repeated_async(schedule.interval, move |_uuid, _lock| {
        let reconciler = job_reconciler.clone();
        Box::pin(async move {
            run_scheduled_pass(&reconciler).await;
        })
    })
    .map_err(|e| eyre!("Failed to create sync job: {}", e))?;
    scheduler
        .add(job)
        .await
        .map_err(|e| eyre!("Failed to schedule sync job: {}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| eyre!("Failed to start scheduler: {}", e))?;

    info!(
        operation = "scheduler_started",
        interval_secs = schedule.interval.as_secs(),
        "Scheduler started successfully"
    );

    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for shutdown signal")?;
    info!(operation = "shutdown", "Shutdown signal received");

    if let Some(task) = startup_pass {
        task.abort();
    }

    if let Err(e) = scheduler.shutdown().await {
        warn!(operation = "shutdown", error = %e, "Scheduler did not shut down cleanly");
    }
    let _ = shutdown_tx.send(());
    server_handle
        .await
        .wrap_err("HTTP server task panicked")?
        .wrap_err("HTTP server failed")?;

    output.success("Stopped");
    Ok(())
}

/// Startup pass in the background, so the scheduler and Ctrl-C handling start
/// immediately. Ticks that fire while it runs are skipped.
fn spawn_startup_pass(reconciler: Arc<Reconciler>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(operation = "scheduler_startup", "Running initial sync on startup");
        run_scheduled_pass(&reconciler).await;
    })
}

/// One reconciliation tick; a tick that lands while a pass is running is skipped.
async fn run_scheduled_pass(reconciler: &Arc<Reconciler>) {
    info!(operation = "scheduled_sync_start", "Starting scheduled sync");
    match reconciler.try_reconcile().await {
        Ok(Some(stats)) => {
            info!(
                operation = "scheduled_sync_complete",
                created = stats.created,
                updated = stats.updated,
                missing = stats.missing,
                deleted = stats.deleted,
                "Scheduled sync completed successfully"
            );
        }
        Ok(None) => {
            warn!(
                operation = "scheduled_sync_skipped",
                "Previous sync still running, skipping this tick"
            );
        }
        Err(e) => {
            error!(
                operation = "scheduled_sync_error",
                error = %e,
                "Scheduled sync failed"
            );
        }
    }
}
