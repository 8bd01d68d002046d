//! External-API clients. One module per upstream (spec §2 item 2, §4.2, §4.3),
//! both routed through the shared [`crate::fabric`] rate-limit/retry/breaker
//! composition. Every operation returns a typed response DTO deserialised
//! from the upstream's JSON — `raw_json` archival happens at the ingest layer,
//! not here.

pub mod noaa;
pub mod nws;

pub use noaa::NoaaClient;
pub use nws::NwsClient;

use std::time::Duration;

pub(crate) fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(5)
        .timeout(Duration::from_secs(30))
        .build()
}
