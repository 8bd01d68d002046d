use super::*;
pub use tokio_test::assert_ok;
pub use trim_margin::MarginTrimmable;

mod loading {
    use super::*;
    use crate::settings::http_api_settings::RateLimitSettings;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use secrecy::{ExposeSecret, Secret};
    use settings_loader::common::http::HttpServerSettings;
    use std::time::Duration;

    fn full_yaml() -> String {
        r##"|---
            |http_api:
            |  timeout_secs: 300
            |  host: 0.0.0.0
            |  port: 8000
            |  rate_limit:
            |    burst_size: 100
            |    per_seconds: 60
            |database:
            |  username: api_user
            |  password: api_pass
            |  host: 0.0.0.0
            |  port: 1234
            |  database_name: weather
            |  require_ssl: true
            |  max_connections: 8
            |  acquire_timeout_secs: 120
            |  idle_timeout_secs: 300
            |ingest_database:
            |  username: ingest_user
            |  password: ingest_pass
            |  host: 0.0.0.0
            |  port: 1234
            |  database_name: weather
            |  require_ssl: true
            |  max_connections: 12
            |  acquire_timeout_secs: 120
            |  idle_timeout_secs: 300
            |nws:
            |  base_url: https://api.weather.gov
            |  user_agent: "(weather-platform, test@example.com)"
            |noaa:
            |  base_url: https://www.ncdc.noaa.gov/cdo-web/api/v2
            |  token: abc123
            |  backfill_start: 2016-01-01
            |schedule: {}
            |tracked_points:
            |  seeds: "34.05,-118.40|47.6,-122.33"
            |import: {}
            |clock_zone: America/Los_Angeles
            |"##
        .trim_margin()
        .unwrap()
    }

    #[test]
    fn test_settings_serde_roundtrip() {
        let yaml = full_yaml();

        let actual: Settings = assert_ok!(serde_yaml::from_str(&yaml));

        assert_eq!(
            actual.http_api,
            HttpApiSettings {
                server: HttpServerSettings { host: "0.0.0.0".to_string(), port: 8000 },
                timeout: Duration::from_secs(300),
                rate_limit: RateLimitSettings {
                    burst_size: 100,
                    per_duration: Duration::from_secs(60),
                },
            }
        );

        assert_eq!(actual.database.username, "api_user");
        assert_eq!(actual.database.password.expose_secret(), "api_pass");
        assert_eq!(actual.database.max_connections, Some(8));

        assert_eq!(actual.ingest_database.username, "ingest_user");
        assert_eq!(actual.ingest_database.max_connections, Some(12));

        assert_eq!(actual.nws.base_url, "https://api.weather.gov");
        assert_eq!(actual.noaa.token.as_deref(), Some("abc123"));
        assert_eq!(actual.noaa.backfill_start, NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());

        assert_eq!(actual.tracked_points.seeds.len(), 2);
        assert_eq!(actual.tracked_points.seeds[0].lat, 34.05);

        assert_eq!(actual.clock_zone, "America/Los_Angeles");
    }

    #[test]
    fn test_schedule_and_import_defaults_when_omitted() {
        let yaml = full_yaml();
        let actual: Settings = assert_ok!(serde_yaml::from_str(&yaml));

        assert_eq!(actual.schedule, ScheduleSettings::default());
        assert_eq!(actual.import, ImportSettings::default());
        assert!(actual.import.historic_dir.is_none());
    }

    #[test]
    fn test_noaa_optional_api_can_be_disabled_for_local_only_operation() {
        let yaml = r##"|---
            |api_enabled: false
            |base_url: https://www.ncdc.noaa.gov/cdo-web/api/v2
            |local_stations_path: ./data/ghcnd-stations.txt
            |"##
        .trim_margin()
        .unwrap();

        let actual: NoaaSettings = assert_ok!(serde_yaml::from_str(&yaml));
        assert!(!actual.api_enabled);
        assert!(actual.token.is_none());
        assert_eq!(actual.local_stations_path.as_deref(), Some("./data/ghcnd-stations.txt"));
    }
}
