//! `GET/POST/DELETE /api/tracked-points`, `POST /api/tracked-points/refresh`
//! (spec §4.8.4, §6). Tracked points carry no stored status column; GET
//! derives `absent|created|refreshing|mapped` by checking for a nearby
//! gridpoint and its primary station (see DESIGN.md Open Question (c)).

use crate::errors::ApiError;
use crate::geo::haversine_m;
use crate::model::TrackedPoint;
use crate::server::params::validate_point;
use crate::server::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing;
use axum::{Json, Router};

/// A tracked point counts as "mapped" to a gridpoint within this distance
/// (spec §4.8.1's 900 ft threshold, reused here for consistency).
const MAPPED_THRESHOLD_M: f64 = 274.32;

#[derive(OpenApi)]
#[openapi(
    paths(list, create, delete, refresh),
    components(schemas(TrackedPointStatus, TrackedPoint)),
    tags((name = "tracked_points", description = "User-tracked coordinates"))
)]
pub struct TrackedPointsApiDoc;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/", routing::get(list).post(create).delete(delete))
        .route("/refresh", routing::post(refresh))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
struct TrackedPointStatus {
    #[serde(flatten)]
    point: TrackedPoint,
    status: &'static str,
}

#[utoipa::path(get, path = "/api/tracked-points", tag = "tracked_points", responses((status = 200, body = [TrackedPointStatus])))]
#[instrument(level = "trace", skip(app), err)]
async fn list(State(app): State<AppState>) -> Result<Json<Vec<TrackedPointStatus>>, ApiError> {
    let points = app.tracked_points.list().await?;
    let mut out = Vec::with_capacity(points.len());
    for point in points {
        let status = status_for(&app, point.lat, point.lon).await?;
        out.push(TrackedPointStatus { point, status });
    }
    Ok(Json(out))
}

async fn status_for(app: &AppState, lat: f64, lon: f64) -> Result<&'static str, ApiError> {
    let Some(gp) = app.gridpoints.nearest(lat, lon).await? else { return Ok("created") };
    let p = crate::model::Point::new(lat, lon);
    if haversine_m(p, gp.point()) > MAPPED_THRESHOLD_M {
        return Ok("created");
    }
    match app.gridpoints.primary_station(&gp.grid_id).await? {
        Some(_) => Ok("mapped"),
        None => Ok("refreshing"),
    }
}

#[derive(Debug, Deserialize)]
struct CreateQuery {
    name: Option<String>,
    lat: f64,
    lon: f64,
}

#[utoipa::path(post, path = "/api/tracked-points", tag = "tracked_points", params(("name" = Option<String>, Query), ("lat" = f64, Query), ("lon" = f64, Query)), responses((status = 200, body = TrackedPoint)))]
#[instrument(level = "trace", skip(app), err)]
async fn create(
    State(app): State<AppState>, Query(q): Query<CreateQuery>,
) -> Result<Json<TrackedPoint>, ApiError> {
    let (lat, lon) = validate_point(q.lat, q.lon)?;
    let point = app.tracked_points.create(q.name.as_deref(), lat, lon).await?;
    Ok(Json(point))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    id: Option<i64>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[utoipa::path(delete, path = "/api/tracked-points", tag = "tracked_points", params(("id" = Option<i64>, Query), ("lat" = Option<f64>, Query), ("lon" = Option<f64>, Query)), responses((status = 204, description = "deleted"), (status = 400, description = "neither id nor lat/lon given")))]
#[instrument(level = "trace", skip(app), err)]
async fn delete(State(app): State<AppState>, Query(q): Query<DeleteQuery>) -> Result<StatusCode, ApiError> {
    let rows = match (q.id, q.lat, q.lon) {
        (Some(id), _, _) => app.tracked_points.delete_by_id(id).await?,
        (None, Some(lat), Some(lon)) => app.tracked_points.delete_by_coords(lat, lon).await?,
        _ => return Err(ApiError::Validation("either id, or both lat and lon, must be given".into())),
    };
    Ok(if rows > 0 { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND })
}

#[utoipa::path(post, path = "/api/tracked-points/refresh", tag = "tracked_points", responses((status = 202, description = "gridpoint refresh started")))]
#[instrument(level = "trace", skip(app))]
async fn refresh(State(app): State<AppState>) -> impl IntoResponse {
    let ctx = app.ingest_ctx.clone();
    tokio::spawn(async move {
        if let Err(e) = crate::ingest::nws_gridpoints::run(&ctx).await {
            tracing::warn!(error = %e, "on-demand gridpoint refresh failed");
        }
    });
    StatusCode::ACCEPTED
}
