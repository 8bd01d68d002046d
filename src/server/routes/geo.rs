//! `GET /api/gridpoints`, `GET /api/alerts`, `GET /api/stations/near`,
//! `GET /api/stations/all` (spec §6) — all served as GeoJSON `FeatureCollection`s.

use crate::cache::{canonical_key, round_bbox, round_coord};
use crate::errors::ApiError;
use crate::model::Station;
use crate::server::caching::cached_json;
use crate::server::geojson_util::{feature_collection, geometry_feature, point_feature};
use crate::server::params::{clamp_i64, parse_bbox, validate_point};
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

fn bbox_key(route: &str, bbox: &crate::model::BoundingBox) -> String {
    canonical_key(
        route,
        vec![
            format!("min_lat={}", round_bbox(bbox.min_lat)),
            format!("min_lon={}", round_bbox(bbox.min_lon)),
            format!("max_lat={}", round_bbox(bbox.max_lat)),
            format!("max_lon={}", round_bbox(bbox.max_lon)),
        ],
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(gridpoints, alerts, stations_near, stations_all),
    components(schemas(Station)),
    tags((name = "geo", description = "Spatial queries over gridpoints, stations, and alerts"))
)]
pub struct GeoApiDoc;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/gridpoints", routing::get(gridpoints))
        .route("/alerts", routing::get(alerts))
        .route("/stations/near", routing::get(stations_near))
        .route("/stations/all", routing::get(stations_all))
}

#[derive(Debug, Deserialize)]
struct BboxQuery {
    bbox: String,
}

#[utoipa::path(get, path = "/api/gridpoints", tag = "geo", params(("bbox" = String, Query)), responses((status = 200, description = "GeoJSON FeatureCollection"), (status = 304, description = "not modified")))]
#[instrument(level = "trace", skip(app, headers), err)]
async fn gridpoints(
    State(app): State<AppState>, headers: HeaderMap, Query(q): Query<BboxQuery>,
) -> Result<Response, ApiError> {
    let bbox = parse_bbox(&q.bbox)?;
    let key = bbox_key("gridpoints", &bbox);
    cached_json(&app.cache, key, CACHE_MAX_AGE, CACHE_STALE_WHILE_REVALIDATE, if_none_match(&headers), || async {
        let rows =
            app.gridpoints.list_in_bbox(bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon).await?;
        let features = rows.iter().map(|gp| point_feature(gp.lon, gp.lat, gp)).collect();
        Ok(feature_collection(features))
    })
    .await
}

#[utoipa::path(get, path = "/api/alerts", tag = "geo", params(("bbox" = String, Query)), responses((status = 200, description = "GeoJSON FeatureCollection"), (status = 304, description = "not modified")))]
#[instrument(level = "trace", skip(app, headers), err)]
async fn alerts(
    State(app): State<AppState>, headers: HeaderMap, Query(q): Query<BboxQuery>,
) -> Result<Response, ApiError> {
    let bbox = parse_bbox(&q.bbox)?;
    let key = bbox_key("alerts", &bbox);
    cached_json(&app.cache, key, CACHE_MAX_AGE, CACHE_STALE_WHILE_REVALIDATE, if_none_match(&headers), || async {
        let rows = app
            .alerts
            .active_in_bbox(bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon, Utc::now())
            .await?;
        let features = rows.iter().map(|a| geometry_feature(a.geometry.clone(), a)).collect();
        Ok(feature_collection(features))
    })
    .await
}

#[derive(Debug, Deserialize)]
struct StationsNearQuery {
    lat: f64,
    lon: f64,
    limit: Option<i64>,
}

#[utoipa::path(get, path = "/api/stations/near", tag = "geo", params(("lat" = f64, Query), ("lon" = f64, Query), ("limit" = Option<i64>, Query)), responses((status = 200, description = "GeoJSON FeatureCollection"), (status = 304, description = "not modified")))]
#[instrument(level = "trace", skip(app, headers), err)]
async fn stations_near(
    State(app): State<AppState>, headers: HeaderMap, Query(q): Query<StationsNearQuery>,
) -> Result<Response, ApiError> {
    let (lat, lon) = validate_point(q.lat, q.lon)?;
    let limit = clamp_i64(q.limit, 1, 100, 25);
    let key = canonical_key(
        "stations_near",
        vec![
            format!("lat={}", round_coord(lat)),
            format!("lon={}", round_coord(lon)),
            format!("limit={limit}"),
        ],
    );
    cached_json(&app.cache, key, CACHE_MAX_AGE, CACHE_STALE_WHILE_REVALIDATE, if_none_match(&headers), || async {
        let rows = app.stations.nearest(lat, lon, limit).await?;
        let features = rows.iter().map(|s| point_feature(s.lon, s.lat, s)).collect();
        Ok(feature_collection(features))
    })
    .await
}

#[derive(Debug, Deserialize)]
struct StationsAllQuery {
    bbox: String,
    limit: Option<i64>,
    #[serde(default, rename = "withData")]
    with_data: bool,
}

#[derive(Debug, Serialize)]
struct StationWithData {
    #[serde(flatten)]
    station: Station,
    latest: Option<crate::model::DailySummary>,
}

#[utoipa::path(get, path = "/api/stations/all", tag = "geo", params(("bbox" = String, Query), ("limit" = Option<i64>, Query), ("withData" = Option<bool>, Query)), responses((status = 200, description = "GeoJSON FeatureCollection"), (status = 304, description = "not modified")))]
#[instrument(level = "trace", skip(app, headers), err)]
async fn stations_all(
    State(app): State<AppState>, headers: HeaderMap, Query(q): Query<StationsAllQuery>,
) -> Result<Response, ApiError> {
    let bbox = parse_bbox(&q.bbox)?;
    let limit = clamp_i64(q.limit, 1, 5_000, 500);
    let key = canonical_key(
        "stations_all",
        vec![
            format!("min_lat={}", round_bbox(bbox.min_lat)),
            format!("min_lon={}", round_bbox(bbox.min_lon)),
            format!("max_lat={}", round_bbox(bbox.max_lat)),
            format!("max_lon={}", round_bbox(bbox.max_lon)),
            format!("limit={limit}"),
            format!("with_data={}", q.with_data),
        ],
    );

    cached_json(&app.cache, key, CACHE_MAX_AGE, CACHE_STALE_WHILE_REVALIDATE, if_none_match(&headers), || async {
        let rows = app
            .stations
            .list_in_bbox(bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon, limit)
            .await?;

        let features = if q.with_data {
            let mut out = Vec::with_capacity(rows.len());
            for station in rows {
                let latest = app.daily.latest(&station.station_id).await?;
                let lon = station.lon;
                let lat = station.lat;
                out.push(point_feature(lon, lat, &StationWithData { station, latest }));
            }
            out
        } else {
            rows.iter().map(|s| point_feature(s.lon, s.lat, s)).collect()
        };

        Ok(feature_collection(features))
    })
    .await
}
