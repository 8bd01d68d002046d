use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open { opened_at: Instant },
}

/// Per-upstream circuit breaker. Tracks failures inside a sliding window; once
/// the count reaches `threshold` the breaker opens for `cool_down`, failing
/// every call fast without consuming a token (spec §4.1).
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    window: Duration,
    cool_down: Duration,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: State,
    failures: VecDeque<Instant>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, window: Duration, cool_down: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            window,
            cool_down,
            inner: Mutex::new(Inner { state: State::Closed, failures: VecDeque::new() }),
        }
    }

    /// Returns `true` when the breaker should fail the call fast. Transitions
    /// `Open -> Closed` (half-open probe) once the cool-down has elapsed,
    /// allowing exactly the next call through.
    pub fn is_open(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Closed => false,
            State::Open { opened_at } => {
                if opened_at.elapsed() >= self.cool_down {
                    inner.state = State::Closed;
                    inner.failures.clear();
                    false
                } else {
                    true
                }
            },
        }
    }

    /// A successful response closes the breaker and resets counters (spec §4.1, §8).
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.state = State::Closed;
        inner.failures.clear();
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        inner.failures.push_back(now);
        while let Some(&front) = inner.failures.front() {
            if now.duration_since(front) > self.window {
                inner.failures.pop_front();
            } else {
                break;
            }
        }

        if inner.failures.len() as u32 >= self.threshold {
            inner.state = State::Open { opened_at: now };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaker_opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(60), Duration::from_secs(300));
        for _ in 0..4 {
            breaker.record_failure();
            assert!(!breaker.is_open());
        }
        breaker.record_failure();
        assert!(breaker.is_open());
    }

    #[test]
    fn test_breaker_success_resets_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60), Duration::from_secs(300));
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_breaker_failures_outside_window_expire() {
        let breaker =
            CircuitBreaker::new(2, Duration::from_millis(20), Duration::from_secs(300));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(40));
        breaker.record_failure();
        assert!(!breaker.is_open(), "first failure should have aged out of the window");
    }

    #[test]
    fn test_breaker_half_opens_after_cool_down() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60), Duration::from_millis(20));
        breaker.record_failure();
        assert!(breaker.is_open());
        std::thread::sleep(Duration::from_millis(40));
        assert!(!breaker.is_open());
    }
}
