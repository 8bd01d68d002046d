use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Alert {
    pub alert_id: String,
    pub event: String,
    pub severity: Option<String>,
    pub certainty: Option<String>,
    pub urgency: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub effective: Option<DateTime<Utc>>,
    pub onset: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
    pub ends: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub message_type: Option<String>,
    pub area_desc: Option<String>,
    /// GeoJSON geometry, SRID 4326; `None` is permitted (spec §4.5).
    pub geometry: Option<Value>,
    pub raw_json: Option<Value>,
}
