//! `GET /api/metrics/summary`, `GET /api/metrics/external` (spec §6).

use crate::cache::canonical_key;
use crate::errors::ApiError;
use crate::fabric::MetricsSnapshot;
use crate::server::caching::cached_json;
use crate::server::state::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Spec §8 scenario 3: two calls within 15s return the same ETag, a third
/// with `If-None-Match` gets a 304, and all carry `max-age=15,
/// stale-while-revalidate=30`.
const CACHE_MAX_AGE: Duration = Duration::from_secs(15);
const CACHE_STALE_WHILE_REVALIDATE: Duration = Duration::from_secs(30);

#[derive(OpenApi)]
#[openapi(
    paths(summary, external),
    components(schemas(MetricsSummary, MetricsSnapshot)),
    tags((name = "metrics", description = "Operational metrics"))
)]
pub struct MetricsApiDoc;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/summary", routing::get(summary))
        .route("/external", routing::get(external))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsSummary {
    pub row_counts: HashMap<String, i64>,
    pub latest_ingest_runs: HashMap<String, DateTime<Utc>>,
}

#[utoipa::path(get, path = "/api/metrics/summary", tag = "metrics", responses((status = 200, body = MetricsSummary), (status = 304, description = "not modified")))]
#[instrument(level = "trace", skip(app, headers), err)]
async fn summary(State(app): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let key = canonical_key("metrics_summary", Vec::new());

    cached_json(&app.cache, key, CACHE_MAX_AGE, CACHE_STALE_WHILE_REVALIDATE, if_none_match, || async {
        const TABLES: &[&str] = &[
            "geo_gridpoint",
            "noaa_station",
            "nws_alert",
            "nws_forecast_hourly",
            "noaa_daily_summary",
            "tracked_point",
        ];

        let mut row_counts = HashMap::with_capacity(TABLES.len());
        for table in TABLES {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&app.db_pool)
                .await?;
            row_counts.insert((*table).to_string(), count);
        }

        let latest_ingest_runs =
            app.ingest_log.metrics_summary().await?.into_iter().collect::<HashMap<_, _>>();

        Ok(MetricsSummary { row_counts, latest_ingest_runs })
    })
    .await
}

#[utoipa::path(get, path = "/api/metrics/external", tag = "metrics", responses((status = 200, body = [MetricsSnapshot])))]
#[instrument(level = "trace", skip(app))]
async fn external(State(app): State<AppState>) -> Json<Vec<MetricsSnapshot>> {
    Json(app.metrics.snapshot_all())
}
