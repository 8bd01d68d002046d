use crate::model::{IngestEvent, IngestRun, IngestRunStatus};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

/// Run/event journal persistence backing `/api/ingest/runs` and
/// `/api/ingest/events` (spec §2 item 4, §6). Written through
/// [`crate::ingest::run_guard::IngestRunGuard`], never directly by the API.
#[derive(Debug, Clone)]
pub struct IngestLogStore {
    pool: PgPool,
}

impl IngestLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn start_run(&self, run_id: &str, job_name: &str) -> Result<IngestRun, sqlx::Error> {
        sqlx::query_as::<_, IngestRun>(
            r#"
            INSERT INTO ingest_run (run_id, job_name, started_at, status)
            VALUES ($1, $2, now(), $3)
            RETURNING run_id, job_name, started_at, finished_at, status, notes
            "#,
        )
        .bind(run_id)
        .bind(job_name)
        .bind(IngestRunStatus::Running)
        .fetch_one(&self.pool)
        .await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn finish_run(
        &self, run_id: &str, status: IngestRunStatus, notes: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE ingest_run SET finished_at = now(), status = $2, notes = $3 WHERE run_id = $1",
        )
        .bind(run_id)
        .bind(status)
        .bind(notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    #[instrument(level = "debug", skip(self, response_headers), err)]
    pub async fn record_event(
        &self, event_id: &str, run_id: &str, source: &str, endpoint: &str,
        http_status: Option<i32>, response_ms: Option<i64>, error: Option<&str>,
        response_headers: Option<Value>,
    ) -> Result<IngestEvent, sqlx::Error> {
        sqlx::query_as::<_, IngestEvent>(
            r#"
            INSERT INTO ingest_event
                (event_id, run_id, source, endpoint, http_status, response_ms, error, response_headers, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            RETURNING event_id, run_id, source, endpoint, http_status, response_ms, error, response_headers, created_at
            "#,
        )
        .bind(event_id)
        .bind(run_id)
        .bind(source)
        .bind(endpoint)
        .bind(http_status)
        .bind(response_ms)
        .bind(error)
        .bind(response_headers)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_runs(&self, limit: i64) -> Result<Vec<IngestRun>, sqlx::Error> {
        sqlx::query_as::<_, IngestRun>(
            "SELECT * FROM ingest_run ORDER BY started_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_events(&self, run_id: &str, limit: i64) -> Result<Vec<IngestEvent>, sqlx::Error> {
        sqlx::query_as::<_, IngestEvent>(
            "SELECT * FROM ingest_event WHERE run_id = $1 ORDER BY created_at ASC LIMIT $2",
        )
        .bind(run_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn metrics_summary(&self) -> Result<Vec<(String, DateTime<Utc>)>, sqlx::Error> {
        sqlx::query_as::<_, (String, DateTime<Utc>)>(
            r#"
            SELECT job_name, MAX(started_at) AS latest
            FROM ingest_run
            WHERE status = 'SUCCESS'
            GROUP BY job_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
