use super::context::{resolve_paths, AppContext};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use showtrack_config::SchedulerConfig;
use showtrack_core::SyncEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Runs the nightly sync on a cron schedule. At most one run is in flight;
/// a tick that fires while the previous run is still going is skipped.
pub struct Scheduler {
    scheduler: JobScheduler,
    engine: Arc<SyncEngine>,
    config: SchedulerConfig,
    running: Arc<Mutex<()>>,
}

impl Scheduler {
    pub async fn new(engine: Arc<SyncEngine>, config: SchedulerConfig) -> Result<Self> {
        let sched = JobScheduler::new().await?;

        Ok(Self {
            scheduler: sched,
            engine,
            config,
            running: Arc::new(Mutex::new(())),
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.config.run_on_startup {
            info!(
                operation = "scheduler_startup",
                "Running nightly sync on startup"
            );
            run_nightly_sync(&self.engine, &self.running).await;
        }

        let engine = self.engine.clone();
        let running = self.running.clone();
        let job = Job::new_async(self.config.schedule.as_str(), move |_uuid, _lock| {
            let engine = engine.clone();
            let running = running.clone();
            Box::pin(async move {
                run_nightly_sync(&engine, &running).await;
            })
        })
        .map_err(|e| eyre!("Invalid schedule '{}': {}", self.config.schedule, e))?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        if self.config.timezone != "UTC" {
            warn!(
                timezone = self.config.timezone,
                "Cron schedule is evaluated in UTC"
            );
        }
        info!(
            operation = "scheduler_started",
            schedule = self.config.schedule,
            timezone = self.config.timezone,
            "Scheduler started"
        );

        tokio::signal::ctrl_c().await?;
        info!(operation = "scheduler_stopping", "Shutdown signal received");

        // Let a run in flight finish its show writes before stopping
        let _guard = self.running.lock().await;
        self.scheduler.shutdown().await?;
        info!(operation = "scheduler_stopped", "Scheduler stopped");
        Ok(())
    }
}

async fn run_nightly_sync(engine: &SyncEngine, running: &Mutex<()>) {
    let Ok(_guard) = running.try_lock() else {
        warn!(
            operation = "scheduled_sync_skipped",
            "Previous nightly sync still running, skipping this run"
        );
        return;
    };

    info!(operation = "scheduled_sync_start", "Starting scheduled nightly sync");
    match engine.bulk_nightly_sync().await {
        Ok(report) => {
            info!(
                operation = "scheduled_sync_complete",
                changed_in_feed = report.changed_in_feed,
                matched_local = report.matched_local,
                updated = report.updated,
                failed = report.failed,
                "Scheduled nightly sync completed"
            );
        }
        Err(e) => {
            error!(
                operation = "scheduled_sync_error",
                error = %e,
                "Scheduled nightly sync failed"
            );
        }
    }
}

/// `--log-file` without a value logs to the default daemon log location.
pub fn resolve_log_file(path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        resolve_paths().daemon_log_file()
    } else {
        path.to_path_buf()
    }
}

/// Command-line flags applied on top of the `[scheduler]` section.
fn scheduler_settings(
    configured: SchedulerConfig,
    schedule_override: Option<String>,
    no_startup_sync: bool,
) -> SchedulerConfig {
    SchedulerConfig {
        schedule: schedule_override.unwrap_or(configured.schedule),
        timezone: configured.timezone,
        run_on_startup: configured.run_on_startup && !no_startup_sync,
    }
}

pub async fn run_daemon(
    schedule_override: Option<String>,
    no_startup_sync: bool,
    output: &Output,
) -> Result<()> {
    let ctx = AppContext::load()?;
    let scheduler_config = scheduler_settings(
        ctx.config.scheduler_or_default(),
        schedule_override,
        no_startup_sync,
    );

    output.info(format!(
        "Starting daemon with schedule '{}' (Ctrl-C to stop)",
        scheduler_config.schedule
    ));

    let mut scheduler = Scheduler::new(ctx.engine.clone(), scheduler_config)
        .await
        .map_err(|e| eyre!("Failed to create scheduler: {}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| eyre!("Scheduler failed: {}", e))?;

    output.success("Daemon stopped");
    Ok(())
}
