//! Read API route groups (spec §4.8, §6). Each submodule owns one family of
//! routes plus its own [`utoipa::OpenApi`] doc; [`crate::server`] mounts the
//! merged [`Router`] and combined OpenAPI document at the literal top-level
//! paths spec §6 names.

pub mod forecast;
pub mod geo;
pub mod history;
pub mod ingest_log;
pub mod layers;
pub mod metrics;
pub mod ml;
pub mod point_summary;
pub mod tracked_points;

use crate::server::state::AppState;
use axum::Router;

/// Everything mounted under `/api` (spec §6). `geo::api()` already declares
/// its routes' full paths (`/gridpoints`, `/alerts`, `/stations/...`), so it
/// is merged rather than nested under a further prefix.
pub fn api() -> Router<AppState> {
    Router::new()
        .merge(geo::api())
        .nest("/forecast", forecast::api())
        .nest("/history", history::api())
        .nest("/point/summary", point_summary::api())
        .nest("/tracked-points", tracked_points::api())
        .nest("/ingest", ingest_log::api())
        .nest("/ml", ml::api())
        .nest("/metrics", metrics::api())
}

/// `/layers/*` (spec §6) lives outside `/api`.
pub fn layers_api() -> Router<AppState> {
    layers::api()
}
