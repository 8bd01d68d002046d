//! Spatial math shared by the NOAA mapping job and the read API's point
//! summary / temperature layer (spec §4.6, §4.8.2, §4.8.3).

mod idw;

pub use idw::{idw_interpolate, idw_interpolate_sq, Weighted};

use crate::model::Point;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance in kilometres (spec §4.6: Haversine, R = 6371 km).
pub fn haversine_km(a: Point, b: Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

pub fn haversine_m(a: Point, b: Point) -> f64 {
    haversine_km(a, b) * 1_000.0
}

/// Bounding extent from a radius around a point, using the standard
/// 111 km/° approximation and `cos(lat)` for longitude (spec §4.3).
pub fn bbox_from_radius_km(center: Point, radius_km: f64) -> crate::model::BoundingBox {
    const KM_PER_DEGREE: f64 = 111.0;
    let dlat = radius_km / KM_PER_DEGREE;
    let lon_scale = center.lat.to_radians().cos().max(1e-6);
    let dlon = radius_km / (KM_PER_DEGREE * lon_scale);

    crate::model::BoundingBox {
        min_lat: center.lat - dlat,
        max_lat: center.lat + dlat,
        min_lon: center.lon - dlon,
        max_lon: center.lon + dlon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        let p = Point::new(34.05, -118.40);
        assert!(haversine_km(p, p) < 1e-9);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Los Angeles to San Francisco, ~559 km great-circle.
        let la = Point::new(34.0522, -118.2437);
        let sf = Point::new(37.7749, -122.4194);
        let d = haversine_km(la, sf);
        assert!((d - 559.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_bbox_from_radius_contains_center() {
        let center = Point::new(34.05, -118.40);
        let bbox = bbox_from_radius_km(center, 50.0);
        assert!(bbox.contains(center));
    }
}
