//! Unit normalisation for NWS hourly forecast periods (spec §4.5, §8 scenario 2).
//! Every forecast field NWS returns in imperial/stringly-typed form is
//! converted to the store's canonical units at ingest time, never at read time.

/// Converts a temperature reading to Celsius given its NWS `temperatureUnit`.
/// Unrecognised units are passed through unchanged rather than rejected, since
/// a single malformed unit tag shouldn't fail an otherwise-good period.
pub fn temperature_to_celsius(value: f64, unit: Option<&str>) -> f64 {
    match unit.map(str::to_ascii_uppercase).as_deref() {
        Some("F") => (value - 32.0) * 5.0 / 9.0,
        _ => value,
    }
}

/// Parses the first numeric token out of a free-form NWS wind string (e.g.
/// `"10 mph"`, `"5 to 10 mph"`) and converts it to m/s. `mph` and `kt` are the
/// only units NWS emits for wind; anything else is assumed already m/s.
pub fn wind_speed_mps(raw: &str) -> Option<f64> {
    let lower = raw.to_ascii_lowercase();
    let value: f64 = lower.split_whitespace().find_map(|tok| tok.parse::<f64>().ok())?;

    if lower.contains("mph") {
        Some(value * 0.44704)
    } else if lower.contains("kt") {
        Some(value * 0.514444)
    } else {
        Some(value)
    }
}

/// Maps an 8-point compass label to degrees; unrecognised labels (including
/// the finer 16-point form NWS sometimes emits) return `None` rather than guessing.
pub fn compass_to_degrees(label: &str) -> Option<f64> {
    match label.to_ascii_uppercase().as_str() {
        "N" => Some(0.0),
        "NE" => Some(45.0),
        "E" => Some(90.0),
        "SE" => Some(135.0),
        "S" => Some(180.0),
        "SW" => Some(225.0),
        "W" => Some(270.0),
        "NW" => Some(315.0),
        _ => None,
    }
}

/// NWS reports precipitation probability as an integer percent; the store
/// keeps it as a `0..1` fraction.
pub fn precip_probability(value_pct: f64) -> f64 {
    value_pct / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_to_celsius_from_fahrenheit() {
        let c = temperature_to_celsius(72.0, Some("F"));
        assert!((c - 22.222).abs() < 1e-2, "got {c}");
    }

    #[test]
    fn test_temperature_passthrough_for_celsius_unit() {
        assert_eq!(temperature_to_celsius(18.0, Some("C")), 18.0);
    }

    #[test]
    fn test_wind_speed_mph_conversion() {
        let mps = wind_speed_mps("10 mph").unwrap();
        assert!((mps - 4.4704).abs() < 1e-4, "got {mps}");
    }

    #[test]
    fn test_wind_speed_knots_conversion() {
        let mps = wind_speed_mps("10 kt").unwrap();
        assert!((mps - 5.14444).abs() < 1e-4, "got {mps}");
    }

    #[test]
    fn test_wind_speed_range_string_takes_first_token() {
        let mps = wind_speed_mps("5 to 10 mph").unwrap();
        assert!((mps - (5.0 * 0.44704)).abs() < 1e-4, "got {mps}");
    }

    #[test]
    fn test_compass_ne_is_45_degrees() {
        assert_eq!(compass_to_degrees("NE"), Some(45.0));
    }

    #[test]
    fn test_compass_unrecognised_label_is_none() {
        assert_eq!(compass_to_degrees("NNE"), None);
    }

    #[test]
    fn test_precip_probability_fraction() {
        assert!((precip_probability(30.0) - 0.30).abs() < 1e-9);
    }
}
