use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Process-wide, per-upstream token bucket. Refills continuously at `qps`;
/// capacity is `max(1, qps * 10)` (spec §4.1).
pub struct TokenBucket {
    limiter: DirectLimiter,
}

impl TokenBucket {
    pub fn new(qps: f64) -> Self {
        let qps = qps.max(0.01);
        let capacity = ((qps * 10.0).round() as u32).max(1);
        let one = NonZeroU32::new(1).expect("1 is non-zero");
        let capacity = NonZeroU32::new(capacity).unwrap_or(one);

        let per_token_nanos = (1.0e9 / qps).round().max(1.0) as u64;
        let quota = Quota::with_period(std::time::Duration::from_nanos(per_token_nanos))
            .unwrap_or_else(|| Quota::per_second(one))
            .allow_burst(capacity);

        Self { limiter: RateLimiter::direct(quota) }
    }

    /// Suspends the caller, FIFO per the governor crate's internal queue,
    /// until at least one token is available, then consumes it.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_does_not_block_within_burst() {
        let bucket = TokenBucket::new(10.0);
        let start = tokio::time::Instant::now();
        for _ in 0..5 {
            bucket.acquire().await;
        }
        assert!(start.elapsed() < std::time::Duration::from_millis(200));
    }
}
