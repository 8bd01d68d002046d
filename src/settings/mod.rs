mod cli_options;
mod http_api_settings;
mod import_settings;
mod noaa_settings;
mod nws_settings;
mod schedule_settings;
#[cfg(test)]
mod tests;
mod tracked_settings;

pub use cli_options::CliOptions;
pub use http_api_settings::{HttpApiSettings, RateLimitSettings};
pub use import_settings::ImportSettings;
pub use noaa_settings::NoaaSettings;
pub use nws_settings::NwsSettings;
pub use schedule_settings::ScheduleSettings;
pub use tracked_settings::{parse_tracked_seeds, TrackedPointsSettings, TrackedSeed};

use settings_loader::common::database::DatabaseSettings;
use settings_loader::SettingsLoader;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub http_api: HttpApiSettings,

    /// Pool backing the read API; max ≈ 8 (spec §5).
    pub database: DatabaseSettings,

    /// Pool backing ingest pipelines; max ≈ 12, never shared with `database`
    /// (spec §5).
    pub ingest_database: DatabaseSettings,

    pub nws: NwsSettings,
    pub noaa: NoaaSettings,

    #[serde(default)]
    pub schedule: ScheduleSettings,

    #[serde(default)]
    pub tracked_points: TrackedPointsSettings,

    #[serde(default)]
    pub import: ImportSettings,

    #[serde(default = "Settings::default_clock_zone")]
    pub clock_zone: String,
}

impl Settings {
    pub fn default_clock_zone() -> String {
        "America/Los_Angeles".to_string()
    }
}

impl SettingsLoader for Settings {
    type Options = CliOptions;
}
