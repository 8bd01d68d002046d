use super::Point;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Station {
    /// Always normalised via [`super::normalize_station_id`].
    pub station_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub elevation_m: Option<f64>,
    pub metadata: Option<Value>,
}

impl Station {
    pub fn point(&self) -> Point {
        Point::new(self.lat, self.lon)
    }
}
