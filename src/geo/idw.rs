/// A single interpolation contributor: an optional value and its distance
/// from the query point. `None` values are skipped entirely (spec §4.8.2).
#[derive(Debug, Clone, Copy)]
pub struct Weighted {
    pub value: Option<f64>,
    pub distance_m: f64,
}

/// Inverse-distance weighting with `w = 1 / max(distance_m, 1)` — the point
/// summary's weighting scheme (spec §4.8.2).
pub fn idw_interpolate(points: &[Weighted]) -> Option<f64> {
    weighted_mean(points, |d| 1.0 / d.max(1.0))
}

/// Inverse-square-distance weighting with `w = 1 / distKm²`, capped at 1e6
/// when distance < 1 m — the temperature layer's weighting scheme (spec
/// §4.8.3). Distances are supplied in kilometres here.
pub fn idw_interpolate_sq(points: &[Weighted]) -> Option<f64> {
    weighted_mean(points, |d_km| {
        if d_km < 0.001 {
            1.0e6
        } else {
            1.0 / (d_km * d_km)
        }
    })
}

fn weighted_mean(points: &[Weighted], weight_fn: impl Fn(f64) -> f64) -> Option<f64> {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for p in points {
        let Some(value) = p.value else { continue };
        let w = weight_fn(p.distance_m);
        numerator += w * value;
        denominator += w;
    }

    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idw_single_station_equals_its_value() {
        // IDW sanity law (spec §8): a single station at any distance returns its own value.
        let points = [Weighted { value: Some(17.3), distance_m: 4_000.0 }];
        let result = idw_interpolate(&points).unwrap();
        assert!((result - 17.3).abs() < 1e-9);
    }

    #[test]
    fn test_idw_three_stations_matches_spec_example() {
        // spec §8 scenario 5: distances 1,2,4 km -> weights 1/1000,1/2000,1/4000; values 10,20,40.
        let points = [
            Weighted { value: Some(10.0), distance_m: 1_000.0 },
            Weighted { value: Some(20.0), distance_m: 2_000.0 },
            Weighted { value: Some(40.0), distance_m: 4_000.0 },
        ];
        let result = idw_interpolate(&points).unwrap();
        assert!((result - 14.2857).abs() < 1e-3, "got {result}");
    }

    #[test]
    fn test_idw_skips_null_contributions() {
        let points = [
            Weighted { value: None, distance_m: 500.0 },
            Weighted { value: Some(25.0), distance_m: 2_000.0 },
        ];
        let result = idw_interpolate(&points).unwrap();
        assert!((result - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_idw_empty_input_is_none() {
        assert!(idw_interpolate(&[]).is_none());
    }

    #[test]
    fn test_idw_sq_caps_weight_for_near_zero_distance() {
        let points = [
            Weighted { value: Some(10.0), distance_m: 0.0 },
            Weighted { value: Some(99.0), distance_m: 50.0 },
        ];
        let result = idw_interpolate_sq(&points).unwrap();
        assert!((result - 10.0).abs() < 0.01, "got {result}");
    }
}
