//! `GET /api/point/summary` (spec §4.8.2): nearest stations, IDW-interpolated
//! temperature/precipitation, and the nearest gridpoint's next hourly period.

use crate::cache::{canonical_key, round_coord};
use crate::errors::ApiError;
use crate::geo::{haversine_m, idw_interpolate, Weighted};
use crate::model::{DailySummary, HourlyForecastRow, Point};
use crate::server::caching::cached_json;
use crate::server::params::{clamp_i64, validate_point};
use crate::server::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing;
use axum::Router;
use chrono::Utc;
use std::time::Duration;

const CACHE_MAX_AGE: Duration = Duration::from_secs(15);
const CACHE_STALE_WHILE_REVALIDATE: Duration = Duration::from_secs(30);

fn if_none_match(headers: &HeaderMap) -> Option<String> {
    headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok()).map(str::to_string)
}

#[derive(OpenApi)]
#[openapi(
    paths(summary),
    components(schemas(PointSummaryResponse, NearestStation, Interpolated, SummaryQueryEcho)),
    tags((name = "point", description = "Interpolated point-in-time summaries"))
)]
pub struct PointSummaryApiDoc;

pub fn api() -> Router<AppState> {
    Router::new().route("/", routing::get(summary))
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    lat: f64,
    lon: f64,
    days: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
struct SummaryQueryEcho {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
struct NearestStation {
    station_id: String,
    name: String,
    distance_m: f64,
    latest: Option<DailySummary>,
    precip_window_mm: Option<f64>,
    coverage_count: i64,
    first_date: Option<chrono::NaiveDate>,
    last_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
struct Interpolated {
    tmean_c: Option<f64>,
    prcp_window_mm: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
struct PointSummaryResponse {
    query: SummaryQueryEcho,
    nearest_stations: Vec<NearestStation>,
    interpolated: Interpolated,
    nearest_gridpoint: Option<String>,
    hourly: Option<HourlyForecastRow>,
}

#[utoipa::path(get, path = "/api/point/summary", tag = "point", params(("lat" = f64, Query), ("lon" = f64, Query), ("days" = Option<i64>, Query), ("limit" = Option<i64>, Query)), responses((status = 200, body = PointSummaryResponse), (status = 304, description = "not modified")))]
#[instrument(level = "trace", skip(app, headers), err)]
async fn summary(
    State(app): State<AppState>, headers: HeaderMap, Query(q): Query<SummaryQuery>,
) -> Result<Response, ApiError> {
    let (lat, lon) = validate_point(q.lat, q.lon)?;
    let days = clamp_i64(q.days, 1, 365, 30);
    let limit = clamp_i64(q.limit, 1, 25, 5);

    let key = canonical_key(
        "point_summary",
        vec![
            format!("lat={}", round_coord(lat)),
            format!("lon={}", round_coord(lon)),
            format!("days={days}"),
            format!("limit={limit}"),
        ],
    );

    cached_json(&app.cache, key, CACHE_MAX_AGE, CACHE_STALE_WHILE_REVALIDATE, if_none_match(&headers), || async {
        let point = Point::new(lat, lon);
        let as_of = crate::ingest::clock::today_in_zone(&app.clock_zone);

        let candidates = app.stations.nearest(lat, lon, limit).await?;
        let mut nearest_stations = Vec::with_capacity(candidates.len());
        let mut temp_terms = Vec::with_capacity(candidates.len());
        let mut precip_terms = Vec::with_capacity(candidates.len());

        for station in &candidates {
            let distance_m = haversine_m(point, station.point());
            let latest = app.daily.latest(&station.station_id).await?;
            let precip_window_mm =
                app.daily.windowed_precip_mm(&station.station_id, as_of, days).await?;
            let (coverage_count, first_date, last_date) =
                app.daily.coverage(&station.station_id, days, as_of).await?;

            let tmean = latest.as_ref().and_then(|d| match (d.tmax_c, d.tmin_c) {
                (Some(tmax), Some(tmin)) => Some((tmax + tmin) / 2.0),
                _ => None,
            });
            temp_terms.push(Weighted { value: tmean, distance_m });
            precip_terms.push(Weighted { value: precip_window_mm, distance_m });

            nearest_stations.push(NearestStation {
                station_id: station.station_id.clone(),
                name: station.name.clone(),
                distance_m,
                latest,
                precip_window_mm,
                coverage_count,
                first_date,
                last_date,
            });
        }

        let interpolated = Interpolated {
            tmean_c: idw_interpolate(&temp_terms),
            prcp_window_mm: idw_interpolate(&precip_terms),
        };

        let nearest_gridpoint = app.gridpoints.nearest(lat, lon).await?;
        let hourly = match &nearest_gridpoint {
            Some(gp) => app.forecasts.next_period(&gp.grid_id, Utc::now()).await?,
            None => None,
        };

        Ok(PointSummaryResponse {
            query: SummaryQueryEcho { lat, lon },
            nearest_stations,
            interpolated,
            nearest_gridpoint: nearest_gridpoint.map(|gp| gp.grid_id),
            hourly,
        })
    })
    .await
}
