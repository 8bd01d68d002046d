//! The outbound-request fabric shared by the NWS and NOAA clients: a per-upstream
//! token bucket, circuit breaker, and retry-with-backoff, composed as
//! `bucket -> breaker -> retry -> transport` (spec §4.1, §9). The breaker is
//! checked once per logical call and only ever records one success/failure per
//! call, so retry amplification cannot trip it early.

mod breaker;
mod metrics;
mod token_bucket;

pub use breaker::CircuitBreaker;
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use token_bucket::TokenBucket;

use crate::errors::UpstreamError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Rate limit + breaker state for one upstream (`NWS` or `NOAA`), plus a handle
/// to the shared metrics registry every call reports into.
pub struct UpstreamFabric {
    upstream: &'static str,
    bucket: TokenBucket,
    breaker: CircuitBreaker,
    metrics: Arc<MetricsRegistry>,
}

impl UpstreamFabric {
    pub fn new(
        upstream: &'static str, qps: f64, cb_threshold: u32, cb_window: Duration,
        cb_cool_down: Duration, metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            upstream,
            bucket: TokenBucket::new(qps),
            breaker: CircuitBreaker::new(cb_threshold, cb_window, cb_cool_down),
            metrics,
        }
    }

    /// Runs `attempt` under the fabric's policies. `attempt` performs exactly one
    /// HTTP round trip; this method decides whether to retry a retryable
    /// response and sleeps the appropriate backoff (honouring `Retry-After`)
    /// between attempts.
    #[instrument(level = "debug", skip(self, attempt), fields(upstream = self.upstream))]
    pub async fn call<F, Fut>(&self, mut attempt: F) -> Result<reqwest::Response, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        if self.breaker.is_open() {
            self.metrics.record_failure(self.upstream);
            return Err(UpstreamError::BreakerOpen { upstream: self.upstream });
        }

        let mut backoff = INITIAL_BACKOFF;
        let mut attempts_made = 0u32;

        loop {
            attempts_made += 1;
            self.bucket.acquire().await;

            match attempt().await {
                Ok(response) if response.status().is_success() => {
                    self.breaker.record_success();
                    self.metrics.record_success(self.upstream);
                    return Ok(response);
                },
                Ok(response) => {
                    let status = response.status();
                    let retryable = status.as_u16() == 429 || status.is_server_error();

                    if !retryable {
                        let body = response.text().await.unwrap_or_default();
                        self.breaker.record_failure();
                        self.metrics.record_failure(self.upstream);
                        return Err(UpstreamError::Permanent {
                            upstream: self.upstream,
                            status: status.as_u16(),
                            body,
                        });
                    }

                    if attempts_made >= MAX_ATTEMPTS {
                        self.breaker.record_failure();
                        self.metrics.record_failure(self.upstream);
                        return Err(UpstreamError::RetriesExhausted {
                            upstream: self.upstream,
                            attempts: attempts_made,
                        });
                    }

                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok());
                    let sleep_for = retry_after.map(Duration::from_secs).unwrap_or(backoff);
                    tracing::debug!(status = status.as_u16(), ?sleep_for, "retrying upstream call");
                    tokio::time::sleep(sleep_for).await;
                    backoff *= 2;
                },
                Err(transport_err) => {
                    if attempts_made >= MAX_ATTEMPTS {
                        self.breaker.record_failure();
                        self.metrics.record_failure(self.upstream);
                        return Err(UpstreamError::Transient {
                            upstream: self.upstream,
                            source: Box::new(transport_err),
                        });
                    }
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                },
            }
        }
    }
}

impl std::fmt::Debug for UpstreamFabric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamFabric").field("upstream", &self.upstream).finish_non_exhaustive()
    }
}

/// Registry of the two process-wide fabrics (spec §5: "process-global per upstream").
/// Held as `Arc`s so the ingest pipelines and the read API's opportunistic
/// fetches share one breaker and one token bucket per upstream, not a copy each.
#[derive(Debug, Clone)]
pub struct FabricRegistry {
    pub nws: Arc<UpstreamFabric>,
    pub noaa: Arc<UpstreamFabric>,
    pub metrics: Arc<MetricsRegistry>,
}

impl FabricRegistry {
    pub fn new(nws: &crate::settings::NwsSettings, noaa: &crate::settings::NoaaSettings) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let nws_fabric = Arc::new(UpstreamFabric::new(
            "NWS",
            nws.qps,
            nws.cb_threshold,
            nws.cb_window,
            nws.cb_cool_down,
            metrics.clone(),
        ));
        let noaa_fabric = Arc::new(UpstreamFabric::new(
            "NOAA",
            noaa.qps,
            noaa.cb_threshold,
            noaa.cb_window,
            noaa.cb_cool_down,
            metrics.clone(),
        ));
        Self { nws: nws_fabric, noaa: noaa_fabric, metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fabric(metrics: Arc<MetricsRegistry>) -> UpstreamFabric {
        UpstreamFabric::new(
            "TEST",
            1_000.0,
            5,
            Duration::from_secs(60),
            Duration::from_millis(50),
            metrics,
        )
    }

    #[tokio::test]
    async fn test_breaker_open_fails_fast_without_attempting() {
        let metrics = Arc::new(MetricsRegistry::new());
        let f = fabric(metrics.clone());
        for _ in 0..5 {
            f.breaker.record_failure();
        }
        let calls = Arc::new(AtomicU32::new(0));
        let calls_inner = calls.clone();
        let result = f
            .call(move || {
                calls_inner.fetch_add(1, Ordering::SeqCst);
                async { unreachable!("breaker should short-circuit before this runs") }
            })
            .await;
        assert!(matches!(result, Err(UpstreamError::BreakerOpen { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
