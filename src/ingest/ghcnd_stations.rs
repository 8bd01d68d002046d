//! Parser for the NOAA GHCN-Daily `ghcnd-stations.txt` fixed-width listing,
//! used both by the NOAA station-discovery pipeline and the admin import CLI
//! (spec §4.6, §6 "CLI") when a local copy is preferred over the stations API.
//!
//! Field layout (1-indexed, inclusive, per NOAA's `readme.txt`):
//! `ID 1-11`, `LATITUDE 13-20`, `LONGITUDE 22-30`, `ELEVATION 32-37`,
//! `NAME 42-71`.

use crate::model::BoundingBox;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct GhcndStationRecord {
    pub station_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub elevation_m: Option<f64>,
}

pub const STATIONS_FILE_NAME: &str = "ghcnd-stations.txt";

pub fn stations_file_path(dir: &str) -> std::path::PathBuf {
    Path::new(dir).join(STATIONS_FILE_NAME)
}

pub fn read_file(path: &Path) -> std::io::Result<Vec<GhcndStationRecord>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().filter_map(parse_line).collect())
}

/// Parses one fixed-width line; returns `None` for blank or too-short lines
/// rather than erroring, matching the importer's "log and continue" posture
/// for malformed input (spec §4.7).
pub fn parse_line(line: &str) -> Option<GhcndStationRecord> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() < 71 {
        return None;
    }

    let slice = |start: usize, end: usize| -> String {
        chars[start..end.min(chars.len())].iter().collect::<String>().trim().to_string()
    };

    let station_id = slice(0, 11);
    let lat: f64 = slice(12, 20).parse().ok()?;
    let lon: f64 = slice(21, 30).parse().ok()?;
    let elevation_m = slice(31, 37).parse::<f64>().ok().filter(|v| *v > -999.0);
    let name = slice(41, 71);

    if station_id.is_empty() {
        return None;
    }

    Some(GhcndStationRecord {
        station_id: crate::model::normalize_station_id(&station_id),
        name,
        lat,
        lon,
        elevation_m,
    })
}

pub fn filter_bbox(records: Vec<GhcndStationRecord>, bbox: BoundingBox) -> Vec<GhcndStationRecord> {
    records.into_iter().filter(|r| bbox.contains(crate::model::Point::new(r.lat, r.lon))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LINE: &str =
        "USW00023174  34.0522 -118.2437  236.2 CA LOS ANGELES INTL AP              72295023174";

    #[test]
    fn test_parse_line_extracts_fields() {
        let record = parse_line(SAMPLE_LINE).expect("should parse");
        assert_eq!(record.station_id, "GHCND:USW00023174");
        assert!((record.lat - 34.0522).abs() < 1e-4);
        assert!((record.lon - (-118.2437)).abs() < 1e-4);
        assert_eq!(record.elevation_m, Some(236.2));
    }

    #[test]
    fn test_parse_line_rejects_short_line() {
        assert!(parse_line("too short").is_none());
    }

    #[test]
    fn test_filter_bbox_excludes_outside_points() {
        let inside = GhcndStationRecord {
            station_id: "GHCND:A".into(), name: "A".into(), lat: 34.0, lon: -118.0, elevation_m: None,
        };
        let outside = GhcndStationRecord {
            station_id: "GHCND:B".into(), name: "B".into(), lat: 50.0, lon: -118.0, elevation_m: None,
        };
        let bbox = BoundingBox { min_lat: 30.0, min_lon: -120.0, max_lat: 40.0, max_lon: -110.0 };
        let filtered = filter_bbox(vec![inside.clone(), outside], bbox);
        assert_eq!(filtered, vec![inside]);
    }
}
