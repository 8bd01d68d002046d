//! `GET /layers/temperature`, `GET /layers/precipitation` (spec §4.8.3, §6):
//! gridpoint-keyed composite layers interpolated from nearby stations.

use crate::cache::{canonical_key, round_bbox};
use crate::errors::ApiError;
use crate::geo::{haversine_km, idw_interpolate_sq, Weighted};
use crate::server::caching::cached_json;
use crate::server::geojson_util::{feature_collection, point_feature};
use crate::server::params::parse_bbox;
use crate::server::params::parse_days_range;
use crate::server::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing;
use axum::Router;
use std::time::Duration;

/// Number of nearest stations contributing to each gridpoint's interpolated
/// value (spec §4.8.3: "6 nearest stations").
const NEAREST_STATIONS: i64 = 6;

const CACHE_MAX_AGE: Duration = Duration::from_secs(15);
const CACHE_STALE_WHILE_REVALIDATE: Duration = Duration::from_secs(30);

fn if_none_match(headers: &HeaderMap) -> Option<String> {
    headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok()).map(str::to_string)
}

#[derive(OpenApi)]
#[openapi(
    paths(temperature, precipitation),
    tags((name = "layers", description = "Interpolated gridded layers"))
)]
pub struct LayersApiDoc;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/temperature", routing::get(temperature))
        .route("/precipitation", routing::get(precipitation))
}

#[derive(Debug, Deserialize)]
struct TemperatureQuery {
    bbox: String,
    #[serde(rename = "hourOffset")]
    hour_offset: Option<i64>,
}

#[derive(Debug, Serialize)]
struct GridTemperature {
    grid_id: String,
    temperature_c: Option<f64>,
    hour_offset: i64,
}

#[utoipa::path(get, path = "/layers/temperature", tag = "layers", params(("bbox" = String, Query), ("hourOffset" = Option<i64>, Query)), responses((status = 200, description = "GeoJSON FeatureCollection"), (status = 304, description = "not modified")))]
#[instrument(level = "trace", skip(app, headers), err)]
async fn temperature(
    State(app): State<AppState>, headers: HeaderMap, Query(q): Query<TemperatureQuery>,
) -> Result<Response, ApiError> {
    let bbox = parse_bbox(&q.bbox)?;
    // Accepted and echoed per spec §6, but the interpolation source is the
    // nearest stations' latest observations, not a forecast horizon.
    let hour_offset = q.hour_offset.unwrap_or(0);
    let key = canonical_key(
        "layers_temperature",
        vec![
            format!("min_lat={}", round_bbox(bbox.min_lat)),
            format!("min_lon={}", round_bbox(bbox.min_lon)),
            format!("max_lat={}", round_bbox(bbox.max_lat)),
            format!("max_lon={}", round_bbox(bbox.max_lon)),
            format!("hour_offset={hour_offset}"),
        ],
    );

    cached_json(&app.cache, key, CACHE_MAX_AGE, CACHE_STALE_WHILE_REVALIDATE, if_none_match(&headers), || async {
        let gridpoints =
            app.gridpoints.list_in_bbox(bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon).await?;

        let mut features = Vec::with_capacity(gridpoints.len());
        for gp in &gridpoints {
            let stations = app.stations.nearest(gp.lat, gp.lon, NEAREST_STATIONS).await?;
            let mut terms = Vec::with_capacity(stations.len());
            for station in &stations {
                let latest = app.daily.latest(&station.station_id).await?;
                let tmean = latest.and_then(|d| match (d.tmax_c, d.tmin_c) {
                    (Some(tmax), Some(tmin)) => Some((tmax + tmin) / 2.0),
                    _ => None,
                });
                let distance_km = haversine_km(gp.point(), station.point());
                terms.push(Weighted { value: tmean, distance_m: distance_km });
            }
            let temperature_c = idw_interpolate_sq(&terms);
            features.push(point_feature(
                gp.lon,
                gp.lat,
                &GridTemperature { grid_id: gp.grid_id.clone(), temperature_c, hour_offset },
            ));
        }

        Ok(feature_collection(features))
    })
    .await
}

#[derive(Debug, Deserialize)]
struct PrecipitationQuery {
    range: String,
}

#[derive(Debug, Serialize)]
struct GridPrecipitation {
    grid_id: String,
    precipitation_mm: Option<f64>,
    range_days: i64,
}

#[utoipa::path(get, path = "/layers/precipitation", tag = "layers", params(("range" = String, Query)), responses((status = 200, description = "GeoJSON FeatureCollection"), (status = 304, description = "not modified")))]
#[instrument(level = "trace", skip(app, headers), err)]
async fn precipitation(
    State(app): State<AppState>, headers: HeaderMap, Query(q): Query<PrecipitationQuery>,
) -> Result<Response, ApiError> {
    let range_days = parse_days_range(&q.range)?;
    let as_of = crate::ingest::clock::today_in_zone(&app.clock_zone);
    let key = canonical_key("layers_precipitation", vec![format!("range_days={range_days}"), format!("as_of={as_of}")]);

    cached_json(&app.cache, key, CACHE_MAX_AGE, CACHE_STALE_WHILE_REVALIDATE, if_none_match(&headers), || async {
        let gridpoints = app.gridpoints.list_all().await?;

        let mut features = Vec::with_capacity(gridpoints.len());
        for gp in &gridpoints {
            let stations = app.stations.nearest(gp.lat, gp.lon, NEAREST_STATIONS).await?;
            let mut terms = Vec::with_capacity(stations.len());
            for station in &stations {
                let precip =
                    app.daily.windowed_precip_mm(&station.station_id, as_of, range_days).await?;
                let distance_km = haversine_km(gp.point(), station.point());
                terms.push(Weighted { value: precip, distance_m: distance_km });
            }
            let precipitation_mm = idw_interpolate_sq(&terms);
            features.push(point_feature(
                gp.lon,
                gp.lat,
                &GridPrecipitation { grid_id: gp.grid_id.clone(), precipitation_mm, range_days },
            ));
        }

        Ok(feature_collection(features))
    })
    .await
}
