use chrono::{DateTime, NaiveDate, Utc};
use strum_macros::{Display, EnumString};

/// `source_type` tag used by the ML read-through routes (spec §4.8.4, §9 —
/// a tagged variant in place of a stringly-typed source tag).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Display, EnumString, ToSchema, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Point,
    Gridpoint,
    Station,
    Tracked,
}

/// One row of `ml_model_run` (spec §6 persisted state layout), backing
/// `GET /api/ml/runs`. Populated out-of-band by the ML training job, same as
/// `ml_prediction`/`ml_weather_prediction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct MlRun {
    pub run_id: String,
    pub model_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct MlPrediction {
    pub run_id: String,
    pub grid_id: String,
    pub valid_time: DateTime<Utc>,
    pub risk_score: Option<f64>,
    pub risk_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct MlWeatherPrediction {
    pub source_type: String,
    pub source_id: String,
    pub as_of_date: NaiveDate,
    pub horizon_hours: i32,
    pub tmin_c: Option<f64>,
    pub tmax_c: Option<f64>,
    pub tmean_c: Option<f64>,
    pub prcp_mm: Option<f64>,
    pub delta_c: Option<f64>,
    pub confidence: Option<f64>,
    pub model_name: Option<String>,
    pub detail: Option<String>,
}
