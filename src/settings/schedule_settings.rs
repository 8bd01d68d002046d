use serde_with::serde_as;
use std::time::Duration;

/// Fixed-delay cadences for each scheduled job family (spec §4.4, §6).
/// Delays are the amount of time to wait *after* a run completes before
/// starting the next one.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduleSettings {
    #[serde(alias = "gridpoint_secs", default = "ScheduleSettings::default_gridpoint")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub gridpoint: Duration,

    #[serde(alias = "hourly_secs", default = "ScheduleSettings::default_hourly")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub hourly: Duration,

    #[serde(alias = "alerts_secs", default = "ScheduleSettings::default_alerts")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub alerts: Duration,

    #[serde(alias = "noaa_stations_secs", default = "ScheduleSettings::default_noaa_stations")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub noaa_stations: Duration,

    #[serde(alias = "noaa_daily_secs", default = "ScheduleSettings::default_noaa_daily")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub noaa_daily: Duration,

    #[serde(alias = "noaa_cache_refresh_secs", default = "ScheduleSettings::default_noaa_cache_refresh")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub noaa_cache_refresh: Duration,

    #[serde(alias = "local_import_secs", default = "ScheduleSettings::default_local_import")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub local_import: Duration,
}

impl ScheduleSettings {
    pub const fn default_gridpoint() -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    pub const fn default_hourly() -> Duration {
        Duration::from_secs(30 * 60)
    }

    pub const fn default_alerts() -> Duration {
        Duration::from_secs(5 * 60)
    }

    pub const fn default_noaa_stations() -> Duration {
        Duration::from_secs(7 * 24 * 60 * 60)
    }

    pub const fn default_noaa_daily() -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    pub const fn default_noaa_cache_refresh() -> Duration {
        Duration::from_secs(6 * 60 * 60)
    }

    pub const fn default_local_import() -> Duration {
        Duration::from_secs(60 * 60)
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            gridpoint: Self::default_gridpoint(),
            hourly: Self::default_hourly(),
            alerts: Self::default_alerts(),
            noaa_stations: Self::default_noaa_stations(),
            noaa_daily: Self::default_noaa_daily(),
            noaa_cache_refresh: Self::default_noaa_cache_refresh(),
            local_import: Self::default_local_import(),
        }
    }
}
