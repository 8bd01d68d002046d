use serde_with::serde_as;
use std::time::Duration;

/// Settings for the NWS (api.weather.gov) client and its ingest cadences.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NwsSettings {
    pub base_url: String,

    /// Required; sent as the `User-Agent` header on every NWS request.
    pub user_agent: String,

    #[serde(default = "NwsSettings::default_qps")]
    pub qps: f64,

    #[serde(default = "NwsSettings::default_cb_threshold")]
    pub cb_threshold: u32,

    #[serde(alias = "cb_window_ms", default = "NwsSettings::default_cb_window")]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub cb_window: Duration,

    #[serde(alias = "cb_cool_down_ms", default = "NwsSettings::default_cb_cool_down")]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub cb_cool_down: Duration,
}

impl NwsSettings {
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
}
