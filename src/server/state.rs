//! Read-API application state (spec §2 item 9, §4.8, §5). Bound to the
//! API-serving DB pool only — the ingest pool lives solely in
//! [`crate::ingest::IngestContext`] (spec §5 "MUST NOT cross-use").

use crate::cache::ResponseCache;
use crate::clients::NwsClient;
use crate::fabric::{FabricRegistry, MetricsRegistry};
use crate::ingest::IngestContext;
use crate::server::api_errors::ApiBootstrapError;
use crate::server::get_connection_pool;
use crate::store::{
    AlertStore, DailySummaryStore, ForecastStore, GridpointStore, IngestLogStore, MlStore,
    StationStore, TrackedPointStore,
};
use crate::Settings;
use axum::extract::FromRef;
use sqlx::PgPool;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub gridpoints: GridpointStore,
    pub stations: StationStore,
    pub forecasts: ForecastStore,
    pub alerts: AlertStore,
    pub daily: DailySummaryStore,
    pub tracked_points: TrackedPointStore,
    pub ingest_log: IngestLogStore,
    pub ml: MlStore,

    pub nws: NwsClient,
    pub metrics: Arc<MetricsRegistry>,
    pub cache: Arc<ResponseCache>,

    /// Shared with the ingest side so `POST /api/tracked-points/refresh`
    /// (spec §4.8.4) can run the gridpoint job on a detached task against the
    /// ingest pool without building a second one.
    pub ingest_ctx: Arc<IngestContext>,

    pub clock_zone: String,
    pub db_pool: PgPool,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").field("clock_zone", &self.clock_zone).finish_non_exhaustive()
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app: &AppState) -> Self {
        app.db_pool.clone()
    }
}

impl AppState {
    /// `fabrics` and `ingest_ctx` are shared with the scheduler (spec §5:
    /// breaker/token-bucket state is process-global per upstream, not a copy
    /// per subsystem).
    #[instrument(level = "debug", skip(settings, fabrics, ingest_ctx), err)]
    pub async fn new(
        settings: &Settings, fabrics: &FabricRegistry, ingest_ctx: Arc<IngestContext>,
    ) -> Result<AppState, ApiBootstrapError> {
        let db_pool = get_connection_pool(&settings.database);
        let nws = NwsClient::new(&settings.nws, fabrics.nws.clone())?;

        Ok(AppState {
            gridpoints: GridpointStore::new(db_pool.clone()),
            stations: StationStore::new(db_pool.clone()),
            forecasts: ForecastStore::new(db_pool.clone()),
            alerts: AlertStore::new(db_pool.clone()),
            daily: DailySummaryStore::new(db_pool.clone()),
            tracked_points: TrackedPointStore::new(db_pool.clone()),
            ingest_log: IngestLogStore::new(db_pool.clone()),
            ml: MlStore::new(db_pool.clone()),
            nws,
            metrics: fabrics.metrics.clone(),
            cache: Arc::new(ResponseCache::new()),
            ingest_ctx,
            clock_zone: settings.clock_zone.clone(),
            db_pool,
        })
    }
}
