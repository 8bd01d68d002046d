//! `GET /api/history/daily`, `GET /api/history/gridpoint` (spec §6).

use crate::errors::ApiError;
use crate::model::DailySummary;
use crate::server::params::clamp_i64;
use crate::server::state::AppState;
use axum::extract::{Query, State};
use axum::routing;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};

#[derive(OpenApi)]
#[openapi(
    paths(daily, gridpoint),
    components(schemas(DailySummary)),
    tags((name = "history", description = "Historical daily observations"))
)]
pub struct HistoryApiDoc;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/daily", routing::get(daily))
        .route("/gridpoint", routing::get(gridpoint))
}

#[derive(Debug, Deserialize)]
struct DailyQuery {
    #[serde(rename = "stationId")]
    station_id: String,
    start: NaiveDate,
    end: NaiveDate,
}

#[utoipa::path(get, path = "/api/history/daily", tag = "history", params(("stationId" = String, Query), ("start" = NaiveDate, Query), ("end" = NaiveDate, Query)), responses((status = 200, body = [DailySummary])))]
#[instrument(level = "trace", skip(app), err)]
async fn daily(
    State(app): State<AppState>, Query(q): Query<DailyQuery>,
) -> Result<Json<Vec<DailySummary>>, ApiError> {
    let rows = app.daily.range(&q.station_id, q.start, q.end).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct GridpointQuery {
    #[serde(rename = "gridId")]
    grid_id: String,
    days: Option<i64>,
}

#[utoipa::path(get, path = "/api/history/gridpoint", tag = "history", params(("gridId" = String, Query), ("days" = Option<i64>, Query)), responses((status = 200, body = [DailySummary])))]
#[instrument(level = "trace", skip(app), err)]
async fn gridpoint(
    State(app): State<AppState>, Query(q): Query<GridpointQuery>,
) -> Result<Json<Vec<DailySummary>>, ApiError> {
    let days = clamp_i64(q.days, 1, 3650, 30);
    let Some(mapping) = app.gridpoints.primary_station(&q.grid_id).await? else {
        return Ok(Json(Vec::new()));
    };
    let end = crate::ingest::clock::today_in_zone(&app.clock_zone);
    let start = end - chrono::Duration::days(days);
    let rows = app.daily.range(&mapping.station_id, start, end).await?;
    Ok(Json(rows))
}
