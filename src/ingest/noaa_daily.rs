//! NOAA daily-summary backfill/refresh pipeline (spec §4.6 "Daily summary
//! backfill and refresh"). Paginates the CDO `data` endpoint per mapped
//! station from `max(dbMax + 1 day, backfill_start)` up to yesterday, in
//! `history_chunk_days`-sized windows, then triggers the cached-aggregate
//! refresh for the day just completed.

use crate::ingest::run_guard::IngestRunGuard;
use crate::ingest::{noaa_cache_refresh, IngestContext};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

pub const JOB_NAME: &str = "noaa_daily";

#[instrument(level = "info", skip(ctx), err)]
pub async fn run(ctx: &IngestContext) -> Result<(), crate::errors::IngestError> {
    let guard = IngestRunGuard::start(ctx.ingest_log.clone(), JOB_NAME).await?;

    let yesterday = crate::ingest::clock::today_in_zone(&ctx.settings.clock_zone) - chrono::Duration::days(1);
    let gridpoints = ctx.gridpoints.list_all().await?;

    let mut rows_total = 0usize;
    let mut stations_tried = HashSet::new();
    for gp in &gridpoints {
        let siblings = ctx.gridpoints.mapped_stations(&gp.grid_id).await?;
        let mut attempted_for_grid = false;

        for sibling in siblings {
            stations_tried.insert(sibling.station_id.clone());
            attempted_for_grid = true;
            match backfill_station(ctx, &sibling.station_id, yesterday).await {
                Ok(rows) => {
                    rows_total += rows;
                    break;
                },
                Err(e) => {
                    // spec §4.6 step 4: on station failure, try each sibling
                    // primary of the same gridpoint once, ordered by distance,
                    // before giving up on this grid for the run.
                    guard.note_item_failure("NOAA", &sibling.station_id, &e).await;
                },
            }
        }

        if !attempted_for_grid {
            guard
                .note_item_failure(
                    "NOAA",
                    &gp.grid_id,
                    &crate::errors::UpstreamError::InvalidRequest(
                        "NOAA",
                        "no_primary_station_for_grid".to_string(),
                    ),
                )
                .await;
        }
    }

    if let Err(e) = noaa_cache_refresh::refresh_all(ctx, yesterday).await {
        tracing::warn!(error = %e, "cached aggregate refresh after daily ingest failed");
    }

    guard
        .finish(Some(format!("{rows_total} daily rows upserted across {} stations", stations_tried.len())))
        .await?;
    Ok(())
}

/// Backfills one station from its stored high-water mark (or the configured
/// `backfill_start`) through `end`, paging in `history_chunk_days` windows
/// and `limit`-sized API pages within each window.
async fn backfill_station(
    ctx: &IngestContext, station_id: &str, end: NaiveDate,
) -> Result<usize, crate::errors::UpstreamError> {
    let db_max = ctx.daily.max_date(station_id).await.map_err(|e| {
        crate::errors::UpstreamError::Transient { upstream: "NOAA", source: Box::new(e) }
    })?;
    let mut cursor = db_max.map_or(ctx.settings.noaa.backfill_start, |d| d + chrono::Duration::days(1));
    if cursor > end {
        return Ok(0);
    }

    let mut rows_written = 0usize;
    while cursor <= end {
        let window_end = (cursor + chrono::Duration::days(ctx.settings.noaa.history_chunk_days - 1)).min(end);
        rows_written += fetch_window(ctx, station_id, cursor, window_end).await?;
        cursor = window_end + chrono::Duration::days(1);
    }
    Ok(rows_written)
}

async fn fetch_window(
    ctx: &IngestContext, station_id: &str, start: NaiveDate, end: NaiveDate,
) -> Result<usize, crate::errors::UpstreamError> {
    const PAGE_SIZE: u32 = 250;
    let mut offset = 0u32;
    let mut by_station_date: HashMap<(String, NaiveDate), PartialRow> = HashMap::new();

    loop {
        let page = ctx.noaa.daily_ghcnd(station_id, start, end, PAGE_SIZE, offset).await?;
        for row in &page.results {
            let entry = by_station_date.entry((row.station.clone(), row.date.date_naive())).or_default();
            // NOAA CDO values are tenths of the metric unit regardless of the
            // `units=metric` query flag.
            match row.datatype.as_str() {
                "TMAX" => entry.tmax_c = Some(row.value / 10.0),
                "TMIN" => entry.tmin_c = Some(row.value / 10.0),
                "PRCP" => entry.prcp_mm = Some(row.value / 10.0),
                _ => {},
            }
        }

        let fetched = offset as u64 + page.results.len() as u64;
        if fetched >= page.metadata.resultset.count || page.results.is_empty() {
            break;
        }
        offset += PAGE_SIZE;
    }

    let mut rows_written = 0usize;
    for ((station, date), partial) in by_station_date {
        ctx.daily
            .upsert(&station, date, partial.tmax_c, partial.tmin_c, partial.prcp_mm, None)
            .await
            .map_err(|e| crate::errors::UpstreamError::Transient { upstream: "NOAA", source: Box::new(e) })?;
        rows_written += 1;
    }

    Ok(rows_written)
}

#[derive(Debug, Default)]
struct PartialRow {
    tmax_c: Option<f64>,
    tmin_c: Option<f64>,
    prcp_mm: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_row_defaults_to_all_none() {
        let row = PartialRow::default();
        assert!(row.tmax_c.is_none() && row.tmin_c.is_none() && row.prcp_mm.is_none());
    }
}
