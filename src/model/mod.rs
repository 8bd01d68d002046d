//! Entity types shared between `store`, `ingest`, and `server`. See spec §3.

mod alert;
mod daily_summary;
mod forecast;
mod gridpoint;
mod ingest_log;
mod ml;
mod station;
mod tracked_point;

pub use alert::Alert;
pub use daily_summary::DailySummary;
pub use forecast::HourlyForecastRow;
pub use gridpoint::{CachedGridAggregate, Gridpoint, GridpointStationMap};
pub use ingest_log::{IngestEvent, IngestRun, IngestRunStatus};
pub use ml::{MlPrediction, MlWeatherPrediction, SourceType};
pub use station::Station;
pub use tracked_point::TrackedPoint;

/// A geographic coordinate in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Round to the 4-decimal precision the response cache keys on (spec §4.8, §9).
    pub fn cache_rounded(&self) -> (String, String) {
        (format!("{:.4}", self.lat), format!("{:.4}", self.lon))
    }
}

/// A validated latitude/longitude bounding box (`min_lat, min_lon, max_lat, max_lon`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, p: Point) -> bool {
        self.min_lat <= p.lat
            && p.lat <= self.max_lat
            && self.min_lon <= p.lon
            && p.lon <= self.max_lon
    }

    /// Rounded to 3 decimals for cache-key canonicalisation (spec §4.8).
    pub fn cache_key(&self) -> String {
        format!(
            "{:.3},{:.3},{:.3},{:.3}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

/// Canonical `GHCND:<id>` normalisation, applied at every write/read boundary
/// per the Station invariant in spec §3.
pub fn normalize_station_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.to_ascii_uppercase().starts_with("GHCND:") {
        let (prefix, rest) = trimmed.split_at(6);
        format!("{}{}", prefix.to_ascii_uppercase(), rest)
    } else {
        format!("GHCND:{trimmed}")
    }
}

/// `grid_id = office + ":" + grid_x + "," + grid_y"` (spec §3, §8).
pub fn grid_id(office: &str, grid_x: i32, grid_y: i32) -> String {
    format!("{office}:{grid_x},{grid_y}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_station_id_adds_missing_prefix() {
        assert_eq!(normalize_station_id("USW00023174"), "GHCND:USW00023174");
    }

    #[test]
    fn test_normalize_station_id_is_idempotent() {
        assert_eq!(normalize_station_id("GHCND:USW00023174"), "GHCND:USW00023174");
        assert_eq!(normalize_station_id("ghcnd:USW00023174"), "GHCND:USW00023174");
    }

    #[test]
    fn test_grid_id_format() {
        assert_eq!(grid_id("LOX", 154, 45), "LOX:154,45");
    }

    #[test]
    fn test_bounding_box_contains() {
        let bbox = BoundingBox { min_lat: 30.0, min_lon: -120.0, max_lat: 40.0, max_lon: -110.0 };
        assert!(bbox.contains(Point::new(34.05, -118.40)));
        assert!(!bbox.contains(Point::new(50.0, -118.40)));
    }
}
