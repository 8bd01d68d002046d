//! One independent fixed-delay worker per job family (spec §4.4). Each loop
//! runs a job, waits `delay` *after* the run completes, then repeats; delay
//! is not fixed-rate, so a slow run pushes its own next start back rather
//! than compounding with others. `job` is attached to every log line in the
//! loop via a tracing span, matching an MDC field.

use crate::ingest::IngestContext;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

pub struct Scheduler {
    tracker: TaskTracker,
    shutdown_tx: watch::Sender<bool>,
}

impl Scheduler {
    /// Spawns one worker per configured job family against the shared `ctx`.
    pub fn start(ctx: Arc<IngestContext>) -> Self {
        let tracker = TaskTracker::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let schedule = ctx.settings.schedule.clone();

        spawn_job(&tracker, shutdown_rx.clone(), crate::ingest::nws_gridpoints::JOB_NAME, schedule.gridpoint, {
            let ctx = ctx.clone();
            move || {
                let ctx = ctx.clone();
                async move { crate::ingest::nws_gridpoints::run(&ctx).await }
            }
        });

        spawn_job(&tracker, shutdown_rx.clone(), crate::ingest::nws_hourly::JOB_NAME, schedule.hourly, {
            let ctx = ctx.clone();
            move || {
                let ctx = ctx.clone();
                async move { crate::ingest::nws_hourly::run(&ctx).await }
            }
        });

        spawn_job(&tracker, shutdown_rx.clone(), crate::ingest::nws_alerts::JOB_NAME, schedule.alerts, {
            let ctx = ctx.clone();
            move || {
                let ctx = ctx.clone();
                async move { crate::ingest::nws_alerts::run(&ctx).await }
            }
        });

        spawn_job(&tracker, shutdown_rx.clone(), crate::ingest::noaa_stations::JOB_NAME, schedule.noaa_stations, {
            let ctx = ctx.clone();
            move || {
                let ctx = ctx.clone();
                async move { crate::ingest::noaa_stations::run(&ctx).await }
            }
        });

        spawn_job(&tracker, shutdown_rx.clone(), crate::ingest::noaa_daily::JOB_NAME, schedule.noaa_daily, {
            let ctx = ctx.clone();
            move || {
                let ctx = ctx.clone();
                async move { crate::ingest::noaa_daily::run(&ctx).await }
            }
        });

        spawn_job(
            &tracker,
            shutdown_rx.clone(),
            crate::ingest::noaa_cache_refresh::JOB_NAME,
            schedule.noaa_cache_refresh,
            {
                let ctx = ctx.clone();
                move || {
                    let ctx = ctx.clone();
                    async move { crate::ingest::noaa_cache_refresh::run(&ctx).await }
                }
            },
        );

        spawn_job(&tracker, shutdown_rx, crate::ingest::local_import::JOB_NAME, schedule.local_import, {
            let ctx = ctx.clone();
            move || {
                let ctx = ctx.clone();
                async move { crate::ingest::local_import::run(&ctx).await }
            }
        });

        tracker.close();
        Self { tracker, shutdown_tx }
    }

    /// Signals every worker to stop after its current run and waits, bounded
    /// at [`SHUTDOWN_GRACE`]; a worker still mid-run past the grace period is
    /// abandoned (its [`crate::ingest::run_guard::IngestRunGuard`] still marks
    /// the run `FAILED` on drop).
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if tokio::time::timeout(SHUTDOWN_GRACE, self.tracker.wait()).await.is_err() {
            tracing::warn!("ingest scheduler shutdown grace period elapsed with workers still running");
        }
    }
}

fn spawn_job<F, Fut>(
    tracker: &TaskTracker, mut shutdown: watch::Receiver<bool>, job_name: &'static str, delay: Duration,
    mut run_once: F,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), crate::errors::IngestError>> + Send,
{
    tracker.spawn(async move {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let span = tracing::info_span!("ingest_job", job = job_name);
            async {
                if let Err(e) = run_once().await {
                    tracing::error!(error = %e, "scheduled ingest run failed");
                }
            }
            .instrument(span)
            .await;

            tokio::select! {
                _ = tokio::time::sleep(delay) => {},
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                },
            }
        }

        tracing::info!(job = job_name, "ingest worker stopped");
    });
}
