//! `GET /health` (spec §6): `{status, time, db}`.

use super::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{routing, Json, Router};
use chrono::Utc;

#[derive(OpenApi)]
#[openapi(paths(serve_health), components(schemas(HealthReport)), tags((name = "health", description = "Service health")))]
pub struct HealthApiDoc;

pub fn api() -> Router<AppState> {
    Router::new().route("/", routing::get(serve_health))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthReport {
    status: &'static str,
    time: chrono::DateTime<Utc>,
    db: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "service and database are reachable", body = HealthReport),
        (status = 500, description = "database is unreachable", body = HealthReport),
    )
)]
#[instrument(level = "trace", skip(app))]
async fn serve_health(State(app): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1").fetch_optional(&app.db_pool).await.is_ok();
    let report = HealthReport {
        status: if db_ok { "up" } else { "down" },
        time: Utc::now(),
        db: if db_ok { "up" } else { "down" },
    };
    let status = if db_ok { axum::http::StatusCode::OK } else { axum::http::StatusCode::INTERNAL_SERVER_ERROR };
    (status, Json(report))
}
