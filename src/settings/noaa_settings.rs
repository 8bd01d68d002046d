use chrono::NaiveDate;
use serde_with::serde_as;
use std::time::Duration;

/// Settings for the NOAA CDO v2 client, station mapping, and backfill.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoaaSettings {
    pub base_url: String,

    #[serde(default = "NoaaSettings::default_enabled")]
    pub api_enabled: bool,

    /// `token` header value; absent when NOAA API calls are disabled in favour of
    /// local CSVs.
    pub token: Option<String>,

    #[serde(default = "NoaaSettings::default_station_radius_km")]
    pub station_radius_km: f64,

    #[serde(default = "NoaaSettings::default_station_limit")]
    pub station_limit: u32,

    #[serde(default = "NoaaSettings::default_map_keep")]
    pub map_keep: usize,

    #[serde(default = "NoaaSettings::default_backfill_start")]
    pub backfill_start: NaiveDate,

    #[serde(default = "NoaaSettings::default_history_chunk_days")]
    pub history_chunk_days: i64,

    #[serde(default = "NoaaSettings::default_qps")]
    pub qps: f64,

    #[serde(default = "NoaaSettings::default_cb_threshold")]
    pub cb_threshold: u32,

    #[serde(alias = "cb_window_ms", default = "NoaaSettings::default_cb_window")]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub cb_window: Duration,

    #[serde(alias = "cb_cool_down_ms", default = "NoaaSettings::default_cb_cool_down")]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub cb_cool_down: Duration,

    /// Directory containing a local GHCN stations listing, preferred over the
    /// stations API when present (spec §4.6).
    pub local_stations_path: Option<String>,

    /// Bounding box `(min_lat, min_lon, max_lat, max_lon)` used to filter the
    /// local stations listing and the admin CLI import.
    pub region_bbox: Option<(f64, f64, f64, f64)>,

    #[serde(default = "NoaaSettings::default_aggregate_window_days")]
    pub aggregate_window_days: i64,
}

impl NoaaSettings {
    pub const fn default_enabled() -> bool {
        true
    }

    pub const fn default_station_radius_km() -> f64 {
        50.0
    }

    pub const fn default_station_limit() -> u32 {
        25
    }

    pub const fn default_map_keep() -> usize {
        5
    }

    pub fn default_backfill_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 1, 1).expect("valid static date")
    }

    pub const fn default_history_chunk_days() -> i64 {
        365
    }

    pub const fn default_qps() -> f64 {
        1.0
    }

    pub const fn default_cb_threshold() -> u32 {
        5
    }

    pub const fn default_cb_window() -> Duration {
        Duration::from_secs(60)
    }

    pub const fn default_cb_cool_down() -> Duration {
        Duration::from_secs(300)
    }

    pub const fn default_aggregate_window_days() -> i64 {
        30
    }
}
