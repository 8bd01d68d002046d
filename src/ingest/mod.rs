//! Scheduled background ingest (spec §2 item 3, §4.4-§4.7). Each submodule is
//! one job family; [`IngestContext`] bundles the clients, stores, and settings
//! every pipeline needs, and [`scheduler::Scheduler`] owns the fixed-delay
//! loops that drive them.

pub mod clock;
pub mod ghcnd_stations;
pub mod local_import;
pub mod noaa_cache_refresh;
pub mod noaa_daily;
pub mod noaa_stations;
pub mod nws_alerts;
pub mod nws_gridpoints;
pub mod nws_hourly;
pub mod run_guard;
pub mod scheduler;
pub mod units;

use crate::clients::{NoaaClient, NwsClient};
use crate::errors::UpstreamError;
use crate::fabric::FabricRegistry;
use crate::store::{
    AlertStore, DailySummaryStore, ForecastStore, GridpointStore, IngestLogStore, StationStore,
    TrackedPointStore,
};
use crate::Settings;
use sqlx::PgPool;

pub use scheduler::Scheduler;

/// Everything a pipeline function needs, built once at startup and shared
/// (via `Arc`) across every scheduled job family.
pub struct IngestContext {
    pub nws: NwsClient,
    pub noaa: NoaaClient,
    pub gridpoints: GridpointStore,
    pub stations: StationStore,
    pub forecasts: ForecastStore,
    pub alerts: AlertStore,
    pub daily: DailySummaryStore,
    pub tracked_points: TrackedPointStore,
    pub ingest_log: IngestLogStore,
    pub settings: Settings,
}

impl IngestContext {
    /// `fabrics` is shared with [`crate::server::AppState`] so the per-upstream
    /// breaker and token bucket are genuinely process-wide (spec §5), not a
    /// separate copy for ingest versus the read API's opportunistic fetches.
    pub fn new(
        settings: &Settings, ingest_pool: PgPool, fabrics: &FabricRegistry,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            nws: NwsClient::new(&settings.nws, fabrics.nws.clone())?,
            noaa: NoaaClient::new(&settings.noaa, fabrics.noaa.clone())?,
            gridpoints: GridpointStore::new(ingest_pool.clone()),
            stations: StationStore::new(ingest_pool.clone()),
            forecasts: ForecastStore::new(ingest_pool.clone()),
            alerts: AlertStore::new(ingest_pool.clone()),
            daily: DailySummaryStore::new(ingest_pool.clone()),
            tracked_points: TrackedPointStore::new(ingest_pool.clone()),
            ingest_log: IngestLogStore::new(ingest_pool),
            settings: settings.clone(),
        })
    }
}
