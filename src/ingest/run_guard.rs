//! RAII-ish run/event journal helper (spec §2 item 4, §4.4, §7 propagation
//! policy). A pipeline starts exactly one [`IngestRunGuard`] per invocation,
//! records one event per external call, and finishes the guard explicitly;
//! [`Drop`] is a safety net that marks an abandoned run `FAILED` rather than
//! leaving it `RUNNING` forever.

use crate::model::IngestRunStatus;
use crate::store::IngestLogStore;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

pub struct IngestRunGuard {
    log: IngestLogStore,
    run_id: String,
    job_name: String,
    fail_count: AtomicU32,
    finished: Arc<AtomicBool>,
}

impl IngestRunGuard {
    #[instrument(level = "info", skip(log), err)]
    pub async fn start(log: IngestLogStore, job_name: &str) -> Result<Self, sqlx::Error> {
        let run_id = cuid2::create_id();
        log.start_run(&run_id, job_name).await?;
        Ok(Self {
            log,
            run_id,
            job_name: job_name.to_string(),
            fail_count: AtomicU32::new(0),
            finished: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Records one event for an external call made under this run. Failures
    /// (a present `error`) bump the run's fail count but never abort it; only
    /// [`crate::errors::IngestError::Fatal`] does that (spec §7).
    #[allow(clippy::too_many_arguments)]
    pub async fn record_event(
        &self, source: &str, endpoint: &str, http_status: Option<i32>, response_ms: Option<i64>,
        error: Option<&str>, response_headers: Option<Value>,
    ) {
        if error.is_some() {
            self.fail_count.fetch_add(1, Ordering::SeqCst);
        }
        let event_id = cuid2::create_id();
        if let Err(e) = self
            .log
            .record_event(&event_id, &self.run_id, source, endpoint, http_status, response_ms, error, response_headers)
            .await
        {
            tracing::warn!(error = %e, run_id = %self.run_id, "failed to persist ingest event");
        }
    }

    /// Convenience for the common "one item in a batch failed" path: records
    /// an event carrying the failure's display text and logs a warning. The
    /// caller's loop continues to the next item.
    pub async fn note_item_failure(&self, source: &str, endpoint: &str, err: &(dyn std::error::Error)) {
        tracing::warn!(source, endpoint, error = %err, run_id = %self.run_id, "ingest item failed");
        self.record_event(source, endpoint, None, None, Some(&err.to_string()), None).await;
    }

    /// Finalizes the run: `SUCCESS` iff no item failures were recorded.
    #[instrument(level = "info", skip(self), fields(run_id = %self.run_id, job = %self.job_name), err)]
    pub async fn finish(self, notes: Option<String>) -> Result<(), sqlx::Error> {
        let fail_count = self.fail_count.load(Ordering::SeqCst);
        let status = if fail_count == 0 { IngestRunStatus::Success } else { IngestRunStatus::Failed };
        let result = self.log.finish_run(&self.run_id, status, notes.as_deref()).await;
        self.finished.store(true, Ordering::SeqCst);
        result
    }

    /// Aborts the run as `FAILED` immediately, for a fatal failure that stops
    /// the whole job rather than a single item (spec §7).
    #[instrument(level = "warn", skip(self), fields(run_id = %self.run_id, job = %self.job_name), err)]
    pub async fn abort(self, reason: String) -> Result<(), sqlx::Error> {
        let result = self.log.finish_run(&self.run_id, IngestRunStatus::Failed, Some(&reason)).await;
        self.finished.store(true, Ordering::SeqCst);
        result
    }
}

impl Drop for IngestRunGuard {
    fn drop(&mut self) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        tracing::warn!(run_id = %self.run_id, job = %self.job_name, "ingest run guard dropped without finishing; marking run failed");
        let log = self.log.clone();
        let run_id = self.run_id.clone();
        tokio::spawn(async move {
            let _ = log
                .finish_run(&run_id, IngestRunStatus::Failed, Some("run guard dropped before completion"))
                .await;
        });
    }
}
