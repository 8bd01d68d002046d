use chrono::NaiveDate;
use serde_json::Value;

/// Keyed by `(station_id, date)`; units are always Celsius and millimetres
/// (spec §3, §8 invariant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct DailySummary {
    pub station_id: String,
    pub date: NaiveDate,
    pub tmax_c: Option<f64>,
    pub tmin_c: Option<f64>,
    pub prcp_mm: Option<f64>,
    pub raw_json: Option<Value>,
}
