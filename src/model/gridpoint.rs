use super::Point;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Gridpoint {
    pub grid_id: String,
    pub office: String,
    pub grid_x: i32,
    pub grid_y: i32,
    pub lat: f64,
    pub lon: f64,
    pub forecast_grid_data_url: Option<String>,
    pub forecast_hourly_url: Option<String>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl Gridpoint {
    pub fn point(&self) -> Point {
        Point::new(self.lat, self.lon)
    }
}

/// A single row of the gridpoint→station ranking; `rank` 0 is `is_primary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct GridpointStationMap {
    pub grid_id: String,
    pub station_id: String,
    pub distance_km: f64,
    pub rank: i32,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CachedGridAggregate {
    pub grid_id: String,
    pub as_of: NaiveDate,
    pub tmean_c: Option<f64>,
    pub prcp_30d_mm: Option<f64>,
    pub last_updated: DateTime<Utc>,
}
