#[macro_use]
extern crate serde;

#[macro_use]
extern crate tracing;

#[macro_use]
extern crate utoipa;

pub mod cache;
pub mod clients;
pub mod errors;
pub mod fabric;
pub mod geo;
pub mod ingest;
pub mod model;
pub mod server;
pub mod settings;
pub mod setup_tracing;
pub mod store;

pub use settings::{CliOptions, Settings};

pub async fn shutdown() {
    tokio::signal::ctrl_c().await.expect("failed to listen for signal event");
}
