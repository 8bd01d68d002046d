//! Persistence layer (spec §2 item 1, §6 "Persisted state layout"). Every
//! function here is a thin, idempotent-where-the-spec-demands wrapper around
//! one or more SQL statements against the PostgreSQL + PostGIS store. Ingest
//! pipelines are the sole writers for their respective tables; the read API
//! calls only the `list_*`/`get_*`/`nearest_*` functions (plus the narrow
//! `tracked_point` and opportunistic-gridpoint-upsert exceptions spec §3 notes).

pub mod alert;
pub mod daily_summary;
pub mod forecast;
pub mod gridpoint;
pub mod ingest_log;
pub mod ml;
pub mod station;
pub mod tracked_point;

pub use alert::AlertStore;
pub use daily_summary::DailySummaryStore;
pub use forecast::ForecastStore;
pub use gridpoint::GridpointStore;
pub use ingest_log::IngestLogStore;
pub use ml::MlStore;
pub use station::StationStore;
pub use tracked_point::TrackedPointStore;
