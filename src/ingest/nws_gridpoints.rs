//! NWS gridpoint-refresh pipeline (spec §4.5 "Refresh gridpoints"). One
//! `points` call per tracked point; a missing/malformed response fails the
//! item, not the run.

use crate::ingest::IngestContext;
use crate::ingest::run_guard::IngestRunGuard;
use crate::model::grid_id;

pub const JOB_NAME: &str = "nws_gridpoints";

#[instrument(level = "info", skip(ctx), err)]
pub async fn run(ctx: &IngestContext) -> Result<(), crate::errors::IngestError> {
    let guard = IngestRunGuard::start(ctx.ingest_log.clone(), JOB_NAME).await?;

    let tracked = ctx.tracked_points.list().await?;
    for point in &tracked {
        let started = std::time::Instant::now();
        match ctx.nws.points(point.lat, point.lon).await {
            Ok(response) => {
                let props = response.properties;
                let grid_id = grid_id(&props.grid_id, props.grid_x, props.grid_y);
                let upsert_result = ctx
                    .gridpoints
                    .upsert(
                        &props.grid_id,
                        props.grid_x,
                        props.grid_y,
                        point.lat,
                        point.lon,
                        props.forecast_grid_data.as_deref(),
                        props.forecast_hourly.as_deref(),
                    )
                    .await;

                match upsert_result {
                    Ok(_) => {
                        guard
                            .record_event(
                                "NWS",
                                "points",
                                Some(200),
                                Some(started.elapsed().as_millis() as i64),
                                None,
                                None,
                            )
                            .await;
                        tracing::info!(grid_id, lat = point.lat, lon = point.lon, "gridpoint refreshed");
                    },
                    Err(e) => guard.note_item_failure("NWS", "points", &e).await,
                }
            },
            Err(e) => guard.note_item_failure("NWS", "points", &e).await,
        }
    }

    guard.finish(Some(format!("{} tracked points processed", tracked.len()))).await?;
    Ok(())
}
