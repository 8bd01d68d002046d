use chrono::{DateTime, Utc};
use serde_json::Value;
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Display, EnumString, ToSchema, Serialize, Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum IngestRunStatus {
    Running,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct IngestRun {
    pub run_id: String,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: IngestRunStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct IngestEvent {
    pub event_id: String,
    pub run_id: String,
    pub source: String,
    pub endpoint: String,
    pub http_status: Option<i32>,
    pub response_ms: Option<i64>,
    pub error: Option<String>,
    pub response_headers: Option<Value>,
    pub created_at: DateTime<Utc>,
}
