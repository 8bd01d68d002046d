//! The single place that resolves "today" for backfill window math (spec
//! §4.6 step 1, §6 `CLOCK_ZONE`). Falls back to UTC if the configured zone
//! name doesn't parse, rather than failing the whole pipeline over a typo.

use chrono::NaiveDate;
use std::str::FromStr;

pub fn today_in_zone(zone: &str) -> NaiveDate {
    match chrono_tz::Tz::from_str(zone) {
        Ok(tz) => chrono::Utc::now().with_timezone(&tz).date_naive(),
        Err(_) => {
            tracing::warn!(zone, "unrecognised clock zone, falling back to UTC");
            chrono::Utc::now().date_naive()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_zone_falls_back_to_utc() {
        let today = today_in_zone("not/a_zone");
        assert_eq!(today, chrono::Utc::now().date_naive());
    }

    #[test]
    fn test_known_zone_parses() {
        let _ = today_in_zone("America/Los_Angeles");
    }
}
