use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// A seeded `(lat, lon)` tracked point, parsed from the pipe-delimited
/// `TRACKED_POINTS="lat,lon|lat,lon"` form described in spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TrackedSeed {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackedPointsSettings {
    #[serde(default, deserialize_with = "deserialize_seeds")]
    pub seeds: Vec<TrackedSeed>,
}

fn deserialize_seeds<'de, D>(deserializer: D) -> Result<Vec<TrackedSeed>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw else { return Ok(Vec::new()) };
    parse_tracked_seeds(&raw).map_err(D::Error::custom)
}

pub fn parse_tracked_seeds(raw: &str) -> Result<Vec<TrackedSeed>, String> {
    raw.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (lat, lon) = pair
                .split_once(',')
                .ok_or_else(|| format!("malformed tracked point entry: {pair}"))?;
            let lat: f64 = lat.trim().parse().map_err(|_| format!("bad latitude in: {pair}"))?;
            let lon: f64 = lon.trim().parse().map_err(|_| format!("bad longitude in: {pair}"))?;
            Ok(TrackedSeed { lat, lon })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tracked_seeds() {
        let actual = parse_tracked_seeds("34.05,-118.40 | 47.6,-122.33").unwrap();
        assert_eq!(actual, vec![
            TrackedSeed { lat: 34.05, lon: -118.40 },
            TrackedSeed { lat: 47.6, lon: -122.33 },
        ]);
    }

    #[test]
    fn test_parse_tracked_seeds_empty() {
        assert!(parse_tracked_seeds("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tracked_seeds_rejects_malformed() {
        assert!(parse_tracked_seeds("34.05").is_err());
    }
}
