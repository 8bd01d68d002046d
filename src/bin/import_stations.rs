//! Administrative entry point (spec §6 "CLI"): imports a local GHCN-Daily
//! stations listing into `noaa_station`, filtered to the configured bounding
//! box, then exits. Exit code 0 on success, non-zero on startup validation
//! failure (spec §6).

use clap::Parser;
use settings_loader::{LoadingOptions, SettingsLoader};
use weather_platform::ingest::ghcnd_stations;
use weather_platform::model::BoundingBox;
use weather_platform::server::get_connection_pool;
use weather_platform::store::StationStore;
use weather_platform::{CliOptions, Settings};

#[tokio::main]
async fn main() {
    let subscriber = weather_platform::setup_tracing::get_tracing_subscriber("info");
    weather_platform::setup_tracing::init_subscriber(subscriber);

    if let Err(err) = run().await {
        tracing::error!(error = %err, "station import failed");
        eprintln!("station import failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let options = CliOptions::parse();
    let settings = Settings::load(&options)?;

    let local_path = settings
        .noaa
        .local_stations_path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("NOAA_LOCAL_STATIONS_PATH is not configured"))?;
    let bbox = settings
        .noaa
        .region_bbox
        .map(|(min_lat, min_lon, max_lat, max_lon)| BoundingBox { min_lat, min_lon, max_lat, max_lon })
        .ok_or_else(|| anyhow::anyhow!("NOAA_REGION_BBOX is not configured"))?;

    let path = ghcnd_stations::stations_file_path(local_path);
    tracing::info!(path = %path.display(), ?bbox, "importing GHCN-Daily stations");

    let records = ghcnd_stations::read_file(&path)?;
    let total = records.len();
    let filtered = ghcnd_stations::filter_bbox(records, bbox);
    tracing::info!(total, kept = filtered.len(), "filtered stations to region");

    let pool = get_connection_pool(&settings.ingest_database);
    let stations = StationStore::new(pool);

    let mut imported = 0usize;
    let mut failed = 0usize;
    for record in filtered {
        match stations
            .upsert(&record.station_id, &record.name, record.lat, record.lon, record.elevation_m, None)
            .await
        {
            Ok(_) => imported += 1,
            Err(err) => {
                failed += 1;
                tracing::warn!(station_id = %record.station_id, error = %err, "failed to upsert station");
            },
        }
    }

    tracing::info!(imported, failed, "station import complete");
    if failed > 0 && imported == 0 {
        anyhow::bail!("all {failed} station upserts failed");
    }

    Ok(())
}
