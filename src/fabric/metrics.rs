//! Process-wide, rolling 60-minute per-upstream call/failure counters (spec §2 item 3,
//! §6 `/api/metrics/external`). Lazily evicted on read and on write — there is no
//! background sweeper, matching the "sampled lazily" glossary definition.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    pub service: String,
    pub calls_last_hour: u64,
    pub failures_last_hour: u64,
    pub failure_pct: f64,
    pub status: String,
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    by_upstream: DashMap<&'static str, Mutex<VecDeque<(Instant, bool)>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, upstream: &'static str) {
        self.record(upstream, true);
    }

    pub fn record_failure(&self, upstream: &'static str) {
        self.record(upstream, false);
    }

    fn record(&self, upstream: &'static str, success: bool) {
        let now = Instant::now();
        let entry = self.by_upstream.entry(upstream).or_default();
        let mut window = entry.lock();
        window.push_back((now, success));
        evict(&mut window, now);
    }

    pub fn snapshot(&self, upstream: &'static str) -> MetricsSnapshot {
        let now = Instant::now();
        let (calls, failures) = match self.by_upstream.get(upstream) {
            Some(entry) => {
                let mut window = entry.lock();
                evict(&mut window, now);
                let calls = window.len() as u64;
                let failures = window.iter().filter(|(_, success)| !success).count() as u64;
                (calls, failures)
            },
            None => (0, 0),
        };
        to_snapshot(upstream, calls, failures)
    }

    pub fn snapshot_all(&self) -> Vec<MetricsSnapshot> {
        self.by_upstream.iter().map(|entry| self.snapshot(*entry.key())).collect()
    }
}

fn evict(window: &mut VecDeque<(Instant, bool)>, now: Instant) {
    const WINDOW: Duration = Duration::from_secs(60 * 60);
    while let Some(&(at, _)) = window.front() {
        if now.duration_since(at) > WINDOW {
            window.pop_front();
        } else {
            break;
        }
    }
}

fn to_snapshot(upstream: &'static str, calls: u64, failures: u64) -> MetricsSnapshot {
    let failure_pct = if calls == 0 { 0.0 } else { (failures as f64 / calls as f64) * 100.0 };
    let status = if calls == 0 {
        "unknown"
    } else if failure_pct >= 50.0 {
        "down"
    } else if failure_pct >= 10.0 {
        "degraded"
    } else {
        "ok"
    };
    MetricsSnapshot {
        service: upstream.to_string(),
        calls_last_hour: calls,
        failures_last_hour: failures,
        failure_pct,
        status: status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_empty_upstream_is_unknown() {
        let registry = MetricsRegistry::new();
        let snap = registry.snapshot("NWS");
        assert_eq!(snap.calls_last_hour, 0);
        assert_eq!(snap.status, "unknown");
    }

    #[test]
    fn test_one_success_one_failure_xor_per_call() {
        let registry = MetricsRegistry::new();
        registry.record_success("NOAA");
        registry.record_failure("NOAA");
        let snap = registry.snapshot("NOAA");
        assert_eq!(snap.calls_last_hour, 2);
        assert_eq!(snap.failures_last_hour, 1);
        assert!((snap.failure_pct - 50.0).abs() < 1e-9);
        assert_eq!(snap.status, "down");
    }
}
