//! NWS active-alerts ingest pipeline (spec §4.5 "Ingest alerts"). One call
//! per tracked point; geometry is stored as-is (already SRID 4326 GeoJSON).

use crate::ingest::run_guard::IngestRunGuard;
use crate::ingest::IngestContext;

pub const JOB_NAME: &str = "nws_alerts";

#[instrument(level = "info", skip(ctx), err)]
pub async fn run(ctx: &IngestContext) -> Result<(), crate::errors::IngestError> {
    let guard = IngestRunGuard::start(ctx.ingest_log.clone(), JOB_NAME).await?;

    let tracked = ctx.tracked_points.list().await?;
    let mut upserted = 0usize;

    for point in &tracked {
        let started = std::time::Instant::now();
        match ctx.nws.active_alerts_for_point(point.lat, point.lon).await {
            Ok(response) => {
                for feature in &response.features {
                    let props = &feature.properties;
                    let raw_json = serde_json::to_value(feature).ok();
                    let result = ctx
                        .alerts
                        .upsert(
                            &props.id,
                            &props.event,
                            props.severity.as_deref(),
                            props.certainty.as_deref(),
                            props.urgency.as_deref(),
                            props.headline.as_deref(),
                            props.description.as_deref(),
                            props.instruction.as_deref(),
                            props.effective,
                            props.onset,
                            props.expires,
                            props.ends,
                            props.status.as_deref(),
                            props.message_type.as_deref(),
                            props.area_desc.as_deref(),
                            feature.geometry.clone(),
                            raw_json,
                        )
                        .await;
                    match result {
                        Ok(_) => upserted += 1,
                        Err(e) => guard.note_item_failure("NWS", "alerts/active", &e).await,
                    }
                }
                guard
                    .record_event(
                        "NWS",
                        "alerts/active",
                        Some(200),
                        Some(started.elapsed().as_millis() as i64),
                        None,
                        None,
                    )
                    .await;
            },
            Err(e) => guard.note_item_failure("NWS", "alerts/active", &e).await,
        }
    }

    guard.finish(Some(format!("{upserted} alerts upserted"))).await?;
    Ok(())
}
