//! NWS hourly-forecast ingest pipeline (spec §4.5 "Ingest hourly forecasts").
//! One fetch per gridpoint that has a stored hourly URL; unit normalisation
//! happens here, once, at write time.

use crate::clients::nws::HourlyPeriod;
use crate::ingest::run_guard::IngestRunGuard;
use crate::ingest::{units, IngestContext};

pub const JOB_NAME: &str = "nws_hourly";

#[instrument(level = "info", skip(ctx), err)]
pub async fn run(ctx: &IngestContext) -> Result<(), crate::errors::IngestError> {
    let guard = IngestRunGuard::start(ctx.ingest_log.clone(), JOB_NAME).await?;

    let gridpoints = ctx.gridpoints.list_all().await?;
    let mut refreshed = 0usize;

    for gp in gridpoints.iter().filter(|gp| gp.forecast_hourly_url.is_some()) {
        let url = gp.forecast_hourly_url.as_deref().expect("filtered for Some");
        let started = std::time::Instant::now();

        match ctx.nws.forecast_hourly(url).await {
            Ok(response) => {
                let mut ok = true;
                for period in response.properties.periods {
                    if let Err(e) = ingest_period(ctx, &gp.grid_id, &period).await {
                        ok = false;
                        guard.note_item_failure("NWS", url, &e).await;
                    }
                }
                if ok {
                    refreshed += 1;
                    guard
                        .record_event(
                            "NWS",
                            url,
                            Some(200),
                            Some(started.elapsed().as_millis() as i64),
                            None,
                            None,
                        )
                        .await;
                }
            },
            Err(e) => guard.note_item_failure("NWS", url, &e).await,
        }
    }

    guard.finish(Some(format!("{refreshed} gridpoints refreshed"))).await?;
    Ok(())
}

async fn ingest_period(
    ctx: &IngestContext, grid_id: &str, period: &HourlyPeriod,
) -> Result<(), sqlx::Error> {
    let temperature_c = period.temperature.map(|v| units::temperature_to_celsius(v, period.temperature_unit.as_deref()));
    let wind_speed_mps = period.wind_speed.as_deref().and_then(units::wind_speed_mps);
    let wind_gust_mps = period.wind_gust.as_deref().and_then(units::wind_speed_mps);
    let wind_dir_deg = period.wind_direction.as_deref().and_then(units::compass_to_degrees);
    let precip_prob = period.probability_of_precipitation.as_ref().and_then(|v| v.value).map(units::precip_probability);
    let relative_humidity = period.relative_humidity.as_ref().and_then(|v| v.value);
    let raw_json = serde_json::to_value(period).ok();

    ctx.forecasts
        .upsert_period(
            grid_id,
            period.start_time,
            period.end_time,
            temperature_c,
            wind_speed_mps,
            wind_gust_mps,
            wind_dir_deg,
            precip_prob,
            relative_humidity,
            period.short_forecast.as_deref(),
            None,
            raw_json,
        )
        .await?;
    Ok(())
}
