//! NOAA station discovery + gridpoint mapping pipeline (spec §4.6 "Station
//! discovery and mapping"). A local GHCN stations listing is preferred when
//! configured; the NOAA stations API is the fallback.

use crate::geo::haversine_km;
use crate::ingest::ghcnd_stations;
use crate::ingest::run_guard::IngestRunGuard;
use crate::ingest::IngestContext;
use crate::model::BoundingBox;

pub const JOB_NAME: &str = "noaa_stations";

#[instrument(level = "info", skip(ctx), err)]
pub async fn run(ctx: &IngestContext) -> Result<(), crate::errors::IngestError> {
    let guard = IngestRunGuard::start(ctx.ingest_log.clone(), JOB_NAME).await?;

    if let Some(dir) = ctx.settings.noaa.local_stations_path.as_deref() {
        match load_from_local_file(ctx, dir).await {
            Ok(count) => {
                guard.record_event("NOAA", "local:ghcnd-stations.txt", Some(200), None, None, None).await;
                tracing::info!(count, "loaded stations from local listing");
            },
            Err(e) => {
                guard
                    .record_event("NOAA", "local:ghcnd-stations.txt", None, None, Some(&e.to_string()), None)
                    .await
            },
        }
    }

    let gridpoints = ctx.gridpoints.list_all().await?;
    let mut mapped = 0usize;

    for gp in &gridpoints {
        if ctx.settings.noaa.local_stations_path.is_none() {
            let started = std::time::Instant::now();
            match ctx.noaa.stations_near(gp.point(), ctx.settings.noaa.station_radius_km, ctx.settings.noaa.station_limit).await {
                Ok(response) => {
                    for result in &response.results {
                        let _ = ctx
                            .stations
                            .upsert(&result.id, &result.name, result.latitude, result.longitude, result.elevation, None)
                            .await;
                    }
                    guard
                        .record_event(
                            "NOAA",
                            "stations",
                            Some(200),
                            Some(started.elapsed().as_millis() as i64),
                            None,
                            None,
                        )
                        .await;
                },
                Err(e) => {
                    guard.note_item_failure("NOAA", "stations", &e).await;
                    continue;
                },
            }
        }

        match rank_and_map(ctx, &gp.grid_id, gp.lat, gp.lon).await {
            Ok(true) => mapped += 1,
            Ok(false) => {},
            Err(e) => guard.note_item_failure("NOAA", "stations_map", &e).await,
        }
    }

    guard.finish(Some(format!("{mapped} gridpoints mapped"))).await?;
    Ok(())
}

async fn load_from_local_file(ctx: &IngestContext, dir: &str) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let path = ghcnd_stations::stations_file_path(dir);
    let records = ghcnd_stations::read_file(&path)?;
    let records = match ctx.settings.noaa.region_bbox {
        Some((min_lat, min_lon, max_lat, max_lon)) => {
            ghcnd_stations::filter_bbox(records, BoundingBox { min_lat, min_lon, max_lat, max_lon })
        },
        None => records,
    };

    let mut count = 0;
    for record in &records {
        ctx.stations
            .upsert(&record.station_id, &record.name, record.lat, record.lon, record.elevation_m, None)
            .await?;
        count += 1;
    }
    Ok(count)
}

/// Selects the `map_keep` nearest candidate stations within `station_radius_km`
/// of `(lat, lon)` and atomically replaces the gridpoint's mapping, making the
/// nearest `is_primary`. Returns `false` (not an error) when no candidates
/// are within range, matching the spec's "the mapping job may find nothing
/// nearby" case distinct from an actual failure.
async fn rank_and_map(
    ctx: &IngestContext, grid_id: &str, lat: f64, lon: f64,
) -> Result<bool, sqlx::Error> {
    let candidates =
        ctx.stations.candidates_within_radius(lat, lon, ctx.settings.noaa.station_radius_km).await?;
    if candidates.is_empty() {
        return Ok(false);
    }

    let center = crate::model::Point::new(lat, lon);
    let mut ranked: Vec<(String, f64)> = candidates
        .into_iter()
        .map(|s| {
            let distance_km = haversine_km(center, s.point());
            (s.station_id, distance_km)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(ctx.settings.noaa.map_keep);

    ctx.gridpoints.replace_station_map(grid_id, &ranked).await?;
    Ok(true)
}
