//! `GET /api/ingest/runs`, `GET /api/ingest/events` (spec §6).

use crate::errors::ApiError;
use crate::model::{IngestEvent, IngestRun};
use crate::server::params::clamp_i64;
use crate::server::state::AppState;
use axum::extract::{Query, State};
use axum::routing;
use axum::{Json, Router};

#[derive(OpenApi)]
#[openapi(
    paths(runs, events),
    components(schemas(IngestRun, IngestEvent)),
    tags((name = "ingest", description = "Ingestion run/event journal"))
)]
pub struct IngestLogApiDoc;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/runs", routing::get(runs))
        .route("/events", routing::get(events))
}

#[derive(Debug, Deserialize)]
struct RunsQuery {
    limit: Option<i64>,
}

#[utoipa::path(get, path = "/api/ingest/runs", tag = "ingest", params(("limit" = Option<i64>, Query)), responses((status = 200, body = [IngestRun])))]
#[instrument(level = "trace", skip(app), err)]
async fn runs(
    State(app): State<AppState>, Query(q): Query<RunsQuery>,
) -> Result<Json<Vec<IngestRun>>, ApiError> {
    let limit = clamp_i64(q.limit, 1, 500, 50);
    let rows = app.ingest_log.list_runs(limit).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    #[serde(rename = "runId")]
    run_id: String,
    limit: Option<i64>,
}

#[utoipa::path(get, path = "/api/ingest/events", tag = "ingest", params(("runId" = String, Query), ("limit" = Option<i64>, Query)), responses((status = 200, body = [IngestEvent])))]
#[instrument(level = "trace", skip(app), err)]
async fn events(
    State(app): State<AppState>, Query(q): Query<EventsQuery>,
) -> Result<Json<Vec<IngestEvent>>, ApiError> {
    let limit = clamp_i64(q.limit, 1, 1000, 100);
    let rows = app.ingest_log.list_events(&q.run_id, limit).await?;
    Ok(Json(rows))
}
