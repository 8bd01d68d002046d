//! Shared query-parameter validation for the read API (spec §4.8 "Validation").
//! Latitude/longitude are range-checked; integer parameters are clamped into
//! an explicit `[min, max]` interval with a default, and a blank value is
//! treated as absent rather than as a parse error.

use crate::errors::ApiError;
use crate::model::BoundingBox;

pub fn validate_lat(lat: f64) -> Result<f64, ApiError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(lat)
    } else {
        Err(ApiError::Validation(format!("lat {lat} out of range [-90, 90]")))
    }
}

pub fn validate_lon(lon: f64) -> Result<f64, ApiError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(lon)
    } else {
        Err(ApiError::Validation(format!("lon {lon} out of range [-180, 180]")))
    }
}

pub fn validate_point(lat: f64, lon: f64) -> Result<(f64, f64), ApiError> {
    Ok((validate_lat(lat)?, validate_lon(lon)?))
}

/// Clamps an optional integer query parameter into `[min, max]`, substituting
/// `default` when absent or blank (spec §4.8).
pub fn clamp_i64(value: Option<i64>, min: i64, max: i64, default: i64) -> i64 {
    value.unwrap_or(default).clamp(min, max)
}

/// Parses a `"minLat,minLon,maxLat,maxLon"` bbox query parameter.
pub fn parse_bbox(raw: &str) -> Result<BoundingBox, ApiError> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [min_lat, min_lon, max_lat, max_lon] = parts.as_slice() else {
        return Err(ApiError::Validation(format!("bbox must have 4 comma-separated values, got {raw}")));
    };
    let parse = |s: &str| -> Result<f64, ApiError> {
        s.parse().map_err(|_| ApiError::Validation(format!("invalid bbox coordinate: {s}")))
    };
    let bbox = BoundingBox {
        min_lat: parse(min_lat)?,
        min_lon: parse(min_lon)?,
        max_lat: parse(max_lat)?,
        max_lon: parse(max_lon)?,
    };
    validate_lat(bbox.min_lat)?;
    validate_lat(bbox.max_lat)?;
    validate_lon(bbox.min_lon)?;
    validate_lon(bbox.max_lon)?;
    Ok(bbox)
}

/// Parses a `"Nd"` range parameter (e.g. `"7d"`) into a day count.
pub fn parse_days_range(raw: &str) -> Result<i64, ApiError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(['d', 'D']).unwrap_or(trimmed);
    digits
        .parse::<i64>()
        .map_err(|_| ApiError::Validation(format!("invalid range, expected \"Nd\": {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_lat_rejects_out_of_range() {
        assert!(validate_lat(91.0).is_err());
        assert!(validate_lat(-91.0).is_err());
        assert!(validate_lat(45.0).is_ok());
    }

    #[test]
    fn test_validate_lon_rejects_out_of_range() {
        assert!(validate_lon(181.0).is_err());
        assert!(validate_lon(-181.0).is_err());
    }

    #[test]
    fn test_clamp_i64_uses_default_when_absent() {
        assert_eq!(clamp_i64(None, 1, 10, 5), 5);
    }

    #[test]
    fn test_clamp_i64_clamps_to_bounds() {
        assert_eq!(clamp_i64(Some(100), 1, 10, 5), 10);
        assert_eq!(clamp_i64(Some(-5), 1, 10, 5), 1);
    }

    #[test]
    fn test_parse_bbox_valid() {
        let bbox = parse_bbox("30.0,-120.0,40.0,-110.0").unwrap();
        assert_eq!(bbox.min_lat, 30.0);
        assert_eq!(bbox.max_lon, -110.0);
    }

    #[test]
    fn test_parse_bbox_rejects_wrong_arity() {
        assert!(parse_bbox("30.0,-120.0").is_err());
    }

    #[test]
    fn test_parse_days_range() {
        assert_eq!(parse_days_range("7d").unwrap(), 7);
        assert_eq!(parse_days_range("30D").unwrap(), 30);
    }
}
