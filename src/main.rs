use clap::Parser;
use settings_loader::{LoadingOptions, SettingsLoader};
use std::sync::Arc;
use weather_platform::fabric::FabricRegistry;
use weather_platform::ingest::{IngestContext, Scheduler};
use weather_platform::server::{self, AppState};
use weather_platform::{CliOptions, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = weather_platform::setup_tracing::get_tracing_subscriber("info");
    weather_platform::setup_tracing::init_subscriber(subscriber);

    let options = CliOptions::parse();
    let settings = load_settings(&options)?;
    tracing::info!(?settings, "loaded settings");

    let ingest_pool = server::get_connection_pool(&settings.ingest_database);
    let fabrics = FabricRegistry::new(&settings.nws, &settings.noaa);
    let ingest_ctx = Arc::new(IngestContext::new(&settings, ingest_pool, &fabrics)?);

    let app_state = AppState::new(&settings, &fabrics, ingest_ctx.clone()).await?;

    let scheduler = Scheduler::start(ingest_ctx);

    let http_server = server::Server::build(app_state, &settings).await?;
    tracing::info!(port = http_server.port(), "starting API server...");

    tokio::select! {
        result = http_server.run_until_stopped() => {
            if let Err(err) = result {
                tracing::error!(error = %err, "API server exited with error");
            }
        },
        _ = weather_platform::shutdown() => {
            tracing::info!("shutdown signal received");
        },
    }

    scheduler.stop().await;

    Ok(())
}

#[tracing::instrument(level = "debug", skip(options), err)]
pub fn load_settings(options: &CliOptions) -> anyhow::Result<Settings> {
    let app_environment = std::env::var(CliOptions::env_app_environment()).ok();
    if app_environment.is_none() {
        tracing::info!("No environment configuration override provided.");
    }

    Settings::load(options).map_err(|err| err.into())
}
