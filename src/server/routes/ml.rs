//! `GET /api/ml/runs`, `GET /api/ml/predictions/latest`,
//! `GET /api/ml/weather/latest`, `GET /api/ml/weather/forecast` (spec §4.8.4, §6).
//!
//! All four are read-through queries against tables this crate never writes
//! (populated out-of-band by the ML training job, per `store::ml`).

use crate::errors::ApiError;
use crate::model::{MlPrediction, MlRun, MlWeatherPrediction, SourceType};
use crate::server::params::{clamp_i64, validate_point};
use crate::server::state::AppState;
use axum::extract::{Query, State};
use axum::routing;
use axum::{Json, Router};

/// Half-width of the lat/lon resolution box used when a request gives
/// coordinates instead of a `sourceId` (spec §4.8.4: "a 0.01° box").
const SOURCE_BOX_DEGREES: f64 = 0.01;

#[derive(OpenApi)]
#[openapi(
    paths(runs, predictions_latest, weather_latest, weather_forecast),
    components(schemas(MlRun, MlPrediction, MlWeatherPrediction, SourceType)),
    tags((name = "ml", description = "Read-through access to ML model output"))
)]
pub struct MlApiDoc;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/runs", routing::get(runs))
        .route("/predictions/latest", routing::get(predictions_latest))
        .route("/weather/latest", routing::get(weather_latest))
        .route("/weather/forecast", routing::get(weather_forecast))
}

#[derive(Debug, Deserialize)]
struct RunsQuery {
    limit: Option<i64>,
}

#[utoipa::path(get, path = "/api/ml/runs", tag = "ml", params(("limit" = Option<i64>, Query)), responses((status = 200, body = [MlRun])))]
#[instrument(level = "trace", skip(app), err)]
async fn runs(
    State(app): State<AppState>, Query(q): Query<RunsQuery>,
) -> Result<Json<Vec<MlRun>>, ApiError> {
    let limit = clamp_i64(q.limit, 1, 500, 50);
    let rows = app.ml.list_runs(limit).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct PredictionsQuery {
    #[serde(rename = "gridId")]
    grid_id: String,
}

#[utoipa::path(get, path = "/api/ml/predictions/latest", tag = "ml", params(("gridId" = String, Query)), responses((status = 200, body = [MlPrediction])))]
#[instrument(level = "trace", skip(app), err)]
async fn predictions_latest(
    State(app): State<AppState>, Query(q): Query<PredictionsQuery>,
) -> Result<Json<Vec<MlPrediction>>, ApiError> {
    let rows = app.ml.latest_predictions(&q.grid_id).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct WeatherSourceQuery {
    #[serde(rename = "sourceType")]
    source_type: SourceType,
    #[serde(rename = "sourceId")]
    source_id: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Resolves a request's source identifier, either directly from `sourceId`
/// or by locating the nearest matching entity within a small lat/lon box
/// (spec §4.8.4: "lat/lon omitted when sourceId is provided").
async fn resolve_source_id(
    app: &AppState, source_type: SourceType, source_id: Option<String>, lat: Option<f64>,
    lon: Option<f64>,
) -> Result<String, ApiError> {
    if let Some(id) = source_id {
        return Ok(id);
    }
    let (lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => validate_point(lat, lon)?,
        _ => {
            return Err(ApiError::Validation(
                "either sourceId, or both lat and lon, must be given".into(),
            ))
        },
    };
    let min_lat = lat - SOURCE_BOX_DEGREES;
    let max_lat = lat + SOURCE_BOX_DEGREES;
    let min_lon = lon - SOURCE_BOX_DEGREES;
    let max_lon = lon + SOURCE_BOX_DEGREES;

    match source_type {
        SourceType::Gridpoint | SourceType::Point => {
            let gridpoints = app.gridpoints.list_in_bbox(min_lat, min_lon, max_lat, max_lon).await?;
            gridpoints
                .into_iter()
                .next()
                .map(|gp| gp.grid_id)
                .ok_or_else(|| ApiError::NotFound("no gridpoint near the given coordinates".into()))
        },
        SourceType::Station => {
            let stations = app.stations.list_in_bbox(min_lat, min_lon, max_lat, max_lon, 1).await?;
            stations
                .into_iter()
                .next()
                .map(|s| s.station_id)
                .ok_or_else(|| ApiError::NotFound("no station near the given coordinates".into()))
        },
        SourceType::Tracked => {
            let points = app.tracked_points.list().await?;
            points
                .into_iter()
                .find(|p| p.lat >= min_lat && p.lat <= max_lat && p.lon >= min_lon && p.lon <= max_lon)
                .map(|p| p.id.to_string())
                .ok_or_else(|| ApiError::NotFound("no tracked point near the given coordinates".into()))
        },
    }
}

#[utoipa::path(get, path = "/api/ml/weather/latest", tag = "ml", params(("sourceType" = SourceType, Query), ("sourceId" = Option<String>, Query), ("lat" = Option<f64>, Query), ("lon" = Option<f64>, Query)), responses((status = 200, description = "latest weather prediction for the source, or null if none")))]
#[instrument(level = "trace", skip(app), err)]
async fn weather_latest(
    State(app): State<AppState>, Query(q): Query<WeatherSourceQuery>,
) -> Result<Json<Option<MlWeatherPrediction>>, ApiError> {
    let source_id = resolve_source_id(&app, q.source_type, q.source_id, q.lat, q.lon).await?;
    let row = app.ml.weather_latest(q.source_type, &source_id).await?;
    Ok(Json(row))
}

#[derive(Debug, Deserialize)]
struct WeatherForecastQuery {
    #[serde(rename = "sourceType")]
    source_type: SourceType,
    #[serde(rename = "sourceId")]
    source_id: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    days: Option<i64>,
}

#[utoipa::path(get, path = "/api/ml/weather/forecast", tag = "ml", params(("sourceType" = SourceType, Query), ("sourceId" = Option<String>, Query), ("lat" = Option<f64>, Query), ("lon" = Option<f64>, Query), ("days" = Option<i64>, Query)), responses((status = 200, body = [MlWeatherPrediction])))]
#[instrument(level = "trace", skip(app), err)]
async fn weather_forecast(
    State(app): State<AppState>, Query(q): Query<WeatherForecastQuery>,
) -> Result<Json<Vec<MlWeatherPrediction>>, ApiError> {
    let source_id = resolve_source_id(&app, q.source_type, q.source_id, q.lat, q.lon).await?;
    let days = clamp_i64(q.days, 1, 10, 7);
    // spec §4.8.4: horizon_hours in [0, (days-1)*24].
    let max_horizon_hours = ((days - 1) * 24) as i32;
    let rows =
        app.ml.weather_forecast(q.source_type, &source_id, 0, max_horizon_hours).await?;
    Ok(Json(rows))
}
