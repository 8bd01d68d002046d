//! Cached grid aggregate refresh (spec §4.6 "Cached grid aggregate refresh").
//! Runs on its own schedule and is also invoked directly at the end of the
//! daily ingest job (spec §4.6 step 5); both call the same [`refresh_all`].

use crate::ingest::run_guard::IngestRunGuard;
use crate::ingest::IngestContext;
use chrono::NaiveDate;

pub const JOB_NAME: &str = "noaa_cache_refresh";

#[instrument(level = "info", skip(ctx), err)]
pub async fn run(ctx: &IngestContext) -> Result<(), crate::errors::IngestError> {
    let guard = IngestRunGuard::start(ctx.ingest_log.clone(), JOB_NAME).await?;
    let as_of = crate::ingest::clock::today_in_zone(&ctx.settings.clock_zone) - chrono::Duration::days(1);
    let refreshed = refresh_all(ctx, as_of).await?;
    guard.finish(Some(format!("{refreshed} gridpoint aggregates refreshed"))).await?;
    Ok(())
}

/// For every gridpoint with a primary station, computes `tmean_c` (mean of
/// `(tmax+tmin)/2` over the window) and `prcp_30d_mm` (precipitation sum over
/// `aggregate_window_days` ending at `as_of`) and upserts the aggregate row.
/// Gridpoints with no primary station still get a placeholder (all-null) row
/// so reads can distinguish "missing" from "no data yet" (spec §4.6).
#[instrument(level = "debug", skip(ctx), err)]
pub async fn refresh_all(
    ctx: &IngestContext, as_of: NaiveDate,
) -> Result<usize, crate::errors::IngestError> {
    let gridpoints = ctx.gridpoints.list_all().await?;
    let mut refreshed = 0usize;

    for gp in &gridpoints {
        let primary = ctx.gridpoints.primary_station(&gp.grid_id).await?;

        let (tmean_c, prcp_30d_mm) = match &primary {
            Some(mapping) => {
                let window_days = ctx.settings.noaa.aggregate_window_days;
                let start = as_of - chrono::Duration::days(window_days);
                let history = ctx.daily.range(&mapping.station_id, start, as_of).await?;
                let tmean = mean_of_daily_midpoints(&history);
                let prcp = ctx.daily.windowed_precip_mm(&mapping.station_id, as_of, window_days).await?;
                (tmean, prcp)
            },
            None => (None, None),
        };

        ctx.gridpoints.upsert_cached_aggregate(&gp.grid_id, as_of, tmean_c, prcp_30d_mm).await?;
        refreshed += 1;
    }

    Ok(refreshed)
}

fn mean_of_daily_midpoints(history: &[crate::model::DailySummary]) -> Option<f64> {
    let midpoints: Vec<f64> = history
        .iter()
        .filter_map(|row| match (row.tmax_c, row.tmin_c) {
            (Some(tmax), Some(tmin)) => Some((tmax + tmin) / 2.0),
            _ => None,
        })
        .collect();

    if midpoints.is_empty() {
        None
    } else {
        Some(midpoints.iter().sum::<f64>() / midpoints.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DailySummary;

    fn row(tmax: Option<f64>, tmin: Option<f64>) -> DailySummary {
        DailySummary {
            station_id: "GHCND:X".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            tmax_c: tmax,
            tmin_c: tmin,
            prcp_mm: None,
            raw_json: None,
        }
    }

    #[test]
    fn test_mean_of_daily_midpoints_skips_incomplete_rows() {
        let history = vec![row(Some(20.0), Some(10.0)), row(None, Some(5.0)), row(Some(30.0), Some(20.0))];
        let mean = mean_of_daily_midpoints(&history).unwrap();
        assert!((mean - 20.0).abs() < 1e-9, "got {mean}");
    }

    #[test]
    fn test_mean_of_daily_midpoints_empty_is_none() {
        assert!(mean_of_daily_midpoints(&[]).is_none());
    }
}
