use chrono::{DateTime, Utc};
use serde_json::Value;

/// One hourly period for a gridpoint, keyed by `(grid_id, start_time)` (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct HourlyForecastRow {
    pub grid_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub temperature_c: Option<f64>,
    pub wind_speed_mps: Option<f64>,
    pub wind_gust_mps: Option<f64>,
    pub wind_dir_deg: Option<f64>,
    pub precip_prob: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub short_forecast: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub raw_json: Option<Value>,
    pub ingested_at: DateTime<Utc>,
}
