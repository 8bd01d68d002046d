//! `GET /api/forecast/hourly`, `GET /api/forecast/daily`,
//! `GET /api/forecast/hourly/point` (spec §4.8.1, §6).

use crate::cache::{canonical_key, round_coord};
use crate::errors::ApiError;
use crate::geo::haversine_m;
use crate::model::{grid_id, HourlyForecastRow, Point};
use crate::server::caching::cached_json;
use crate::server::params::{clamp_i64, validate_point};
use crate::server::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Live hourly point resolution is only trusted to reuse a stored gridpoint
/// when within this distance of it (spec §4.8.1: 900 ft).
const NEAREST_GRIDPOINT_THRESHOLD_M: f64 = 274.32;

const CACHE_MAX_AGE: Duration = Duration::from_secs(15);
const CACHE_STALE_WHILE_REVALIDATE: Duration = Duration::from_secs(30);

fn if_none_match(headers: &HeaderMap) -> Option<String> {
    headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok()).map(str::to_string)
}

#[derive(OpenApi)]
#[openapi(
    paths(hourly, daily, hourly_point),
    components(schemas(HourlyForecastRow, DailyForecastSummary)),
    tags((name = "forecast", description = "NWS hourly/daily forecast access"))
)]
pub struct ForecastApiDoc;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/hourly", routing::get(hourly))
        .route("/daily", routing::get(daily))
        .route("/hourly/point", routing::get(hourly_point))
}

#[derive(Debug, Deserialize)]
struct HourlyQuery {
    #[serde(rename = "gridId")]
    grid_id: String,
    limit: Option<i64>,
    hours: Option<i64>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

#[utoipa::path(get, path = "/api/forecast/hourly", tag = "forecast", params(("gridId" = String, Query)), responses((status = 200, body = [HourlyForecastRow])))]
#[instrument(level = "trace", skip(app), err)]
async fn hourly(
    State(app): State<AppState>, Query(q): Query<HourlyQuery>,
) -> Result<Json<Vec<HourlyForecastRow>>, ApiError> {
    let rows = match (q.start, q.end) {
        (Some(start), Some(end)) => app.forecasts.range(&q.grid_id, start, end).await?,
        _ => {
            let now = Utc::now();
            let limit = match q.hours {
                Some(hours) => clamp_i64(Some(hours), 1, 500, 48),
                None => clamp_i64(q.limit, 1, 500, 24),
            };
            app.forecasts.future_periods(&q.grid_id, now, limit).await?
        },
    };
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct DailyQuery {
    #[serde(rename = "gridId")]
    grid_id: String,
    days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
struct DailyForecastSummary {
    date: chrono::NaiveDate,
    tmax_c: Option<f64>,
    tmin_c: Option<f64>,
    max_precip_prob: Option<f64>,
}

#[utoipa::path(get, path = "/api/forecast/daily", tag = "forecast", params(("gridId" = String, Query), ("days" = Option<i64>, Query)), responses((status = 200, body = [DailyForecastSummary])))]
#[instrument(level = "trace", skip(app), err)]
async fn daily(
    State(app): State<AppState>, Query(q): Query<DailyQuery>,
) -> Result<Json<Vec<DailyForecastSummary>>, ApiError> {
    let days = clamp_i64(q.days, 1, 10, 7);
    let now = Utc::now();
    let end = now + chrono::Duration::days(days);
    let periods = app.forecasts.range(&q.grid_id, now, end).await?;

    let mut by_date: std::collections::BTreeMap<chrono::NaiveDate, DailyForecastSummary> =
        std::collections::BTreeMap::new();
    for period in periods {
        let date = period.start_time.date_naive();
        let entry = by_date.entry(date).or_insert(DailyForecastSummary {
            date,
            tmax_c: None,
            tmin_c: None,
            max_precip_prob: None,
        });
        if let Some(t) = period.temperature_c {
            entry.tmax_c = Some(entry.tmax_c.map_or(t, |cur| cur.max(t)));
            entry.tmin_c = Some(entry.tmin_c.map_or(t, |cur| cur.min(t)));
        }
        if let Some(p) = period.precip_prob {
            entry.max_precip_prob = Some(entry.max_precip_prob.map_or(p, |cur| cur.max(p)));
        }
    }

    Ok(Json(by_date.into_values().collect()))
}

#[derive(Debug, Deserialize)]
struct HourlyPointQuery {
    lat: f64,
    lon: f64,
    limit: Option<i64>,
    mode: Option<String>,
    #[serde(default)]
    refresh: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum HourlyPointResponse {
    List { periods: Vec<HourlyForecastRow>, grid_id: String },
    Single { hourly: Option<HourlyForecastRow>, grid_id: String },
}

#[utoipa::path(get, path = "/api/forecast/hourly/point", tag = "forecast", params(("lat" = f64, Query), ("lon" = f64, Query)), responses((status = 200, description = "next or full hourly periods for the resolved gridpoint"), (status = 304, description = "not modified")))]
#[instrument(level = "trace", skip(app, headers), err)]
async fn hourly_point(
    State(app): State<AppState>, headers: HeaderMap, Query(q): Query<HourlyPointQuery>,
) -> Result<Response, ApiError> {
    let (lat, lon) = validate_point(q.lat, q.lon)?;
    let limit = clamp_i64(q.limit, 1, 168, 24);
    let mode = q.mode.clone().unwrap_or_default();

    let key = canonical_key(
        "hourly_point",
        vec![
            format!("lat={}", round_coord(lat)),
            format!("lon={}", round_coord(lon)),
            format!("limit={limit}"),
            format!("mode={mode}"),
            format!("refresh={}", q.refresh),
        ],
    );

    cached_json(&app.cache, key, CACHE_MAX_AGE, CACHE_STALE_WHILE_REVALIDATE, if_none_match(&headers), || async {
        let now = Utc::now();
        let point = Point::new(lat, lon);

        let nearest = app.gridpoints.nearest(lat, lon).await?;
        let resolved_grid_id = match &nearest {
            Some(gp) if haversine_m(point, gp.point()) <= NEAREST_GRIDPOINT_THRESHOLD_M && !q.refresh => {
                gp.grid_id.clone()
            },
            _ => {
                let response = app.nws.points(lat, lon).await?;
                let props = response.properties;
                let resolved_grid_id = grid_id(&props.grid_id, props.grid_x, props.grid_y);
                app.gridpoints
                    .upsert(
                        &props.grid_id,
                        props.grid_x,
                        props.grid_y,
                        lat,
                        lon,
                        props.forecast_grid_data.as_deref(),
                        props.forecast_hourly.as_deref(),
                    )
                    .await?;
                resolved_grid_id
            },
        };

        let mut periods = app.forecasts.future_periods(&resolved_grid_id, now, limit).await?;
        if periods.is_empty() || q.refresh {
            if let Some(gp) = app.gridpoints.get(&resolved_grid_id).await? {
                if let Some(url) = &gp.forecast_hourly_url {
                    periods = fetch_and_persist_hourly(&app, &resolved_grid_id, url).await?;
                }
            }
        }

        Ok(match q.mode.as_deref() {
            Some("list") => HourlyPointResponse::List { periods, grid_id: resolved_grid_id },
            _ => HourlyPointResponse::Single {
                hourly: periods.into_iter().next(),
                grid_id: resolved_grid_id,
            },
        })
    })
    .await
}

async fn fetch_and_persist_hourly(
    app: &AppState, grid_id: &str, url: &str,
) -> Result<Vec<HourlyForecastRow>, ApiError> {
    let response = app.nws.forecast_hourly(url).await?;
    let mut persisted = Vec::with_capacity(response.properties.periods.len());
    for period in &response.properties.periods {
        let temperature_c = period
            .temperature
            .map(|t| crate::ingest::units::temperature_to_celsius(t, period.temperature_unit.as_deref()));
        let wind_speed_mps =
            period.wind_speed.as_deref().and_then(crate::ingest::units::wind_speed_mps);
        let wind_gust_mps =
            period.wind_gust.as_deref().and_then(crate::ingest::units::wind_speed_mps);
        let wind_dir_deg =
            period.wind_direction.as_deref().and_then(crate::ingest::units::compass_to_degrees);
        let precip_prob = period
            .probability_of_precipitation
            .as_ref()
            .and_then(|v| v.value)
            .map(crate::ingest::units::precip_probability);
        let raw_json = serde_json::to_value(period).ok();

        let row = app
            .forecasts
            .upsert_period(
                grid_id,
                period.start_time,
                period.end_time,
                temperature_c,
                wind_speed_mps,
                wind_gust_mps,
                wind_dir_deg,
                precip_prob,
                period.relative_humidity.as_ref().and_then(|v| v.value),
                period.short_forecast.as_deref(),
                None,
                raw_json,
            )
            .await?;
        persisted.push(row);
    }
    persisted.sort_by_key(|p| p.start_time);
    Ok(persisted)
}
