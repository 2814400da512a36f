//! Process-wide guard against a data provider that is refusing requests.
//!
//! One breaker is shared by every provider a process builds, so its memory
//! outlives a single forecast run. It opens at once on HTTP 403 and after
//! `failure_threshold` consecutive failed fetches. Retries inside one fetch
//! count as a single failure. While open, fetches fail fast until the
//! cooldown has elapsed.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

/// Cooldown after the breaker opens.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30 * 60);

/// Consecutive failed fetches that open the breaker.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Closed { failed_fetches: u32 },
    Open { since: Instant },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    gate: Mutex<Gate>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN, DEFAULT_FAILURE_THRESHOLD)
    }
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            gate: Mutex::new(Gate::Closed { failed_fetches: 0 }),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// A default breaker ready to hand to several providers.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The breaker shared by every provider in this process.
    pub fn process_wide() -> Arc<Self> {
        static BREAKER: OnceLock<Arc<CircuitBreaker>> = OnceLock::new();
        Arc::clone(BREAKER.get_or_init(Self::shared))
    }

    // Every write leaves the gate consistent, so poisoning is ignored.
    fn gate(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a fetch may go out. Closes the gate once the cooldown is over.
    pub fn is_allowed(&self) -> bool {
        let mut gate = self.gate();
        match *gate {
            Gate::Closed { .. } => true,
            Gate::Open { since } if since.elapsed() >= self.cooldown => {
                *gate = Gate::Closed { failed_fetches: 0 };
                true
            }
            Gate::Open { .. } => false,
        }
    }

    pub fn record_fetch_success(&self) {
        let mut gate = self.gate();
        if let Gate::Closed { .. } = *gate {
            *gate = Gate::Closed { failed_fetches: 0 };
        }
    }

    /// Count one fetch that gave up after exhausting its retries.
    pub fn record_fetch_failure(&self) {
        let mut gate = self.gate();
        if let Gate::Closed { failed_fetches } = *gate {
            let failed_fetches = failed_fetches + 1;
            *gate = if failed_fetches >= self.failure_threshold {
                Gate::Open {
                    since: Instant::now(),
                }
            } else {
                Gate::Closed { failed_fetches }
            };
        }
    }

    /// Open immediately, e.g. on HTTP 403.
    pub fn trip(&self) {
        *self.gate() = Gate::Open {
            since: Instant::now(),
        };
    }

    /// Time left before fetches are allowed again.
    pub fn remaining_cooldown(&self) -> Duration {
        match *self.gate() {
            Gate::Closed { .. } => Duration::ZERO,
            Gate::Open { since } => self.cooldown.saturating_sub(since.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failed_fetches() {
        let breaker = CircuitBreaker::new(Duration::from_secs(60), 2);
        assert!(breaker.is_allowed());
        breaker.record_fetch_failure();
        assert!(breaker.is_allowed());
        breaker.record_fetch_failure();
        assert!(!breaker.is_allowed());
        assert!(breaker.remaining_cooldown() > Duration::ZERO);
    }

    #[test]
    fn success_clears_the_failure_streak() {
        let breaker = CircuitBreaker::default();
        breaker.record_fetch_failure();
        breaker.record_fetch_failure();
        breaker.record_fetch_success();
        breaker.record_fetch_failure();
        breaker.record_fetch_failure();
        assert!(breaker.is_allowed());
        assert_eq!(breaker.remaining_cooldown(), Duration::ZERO);
    }

    #[test]
    fn success_does_not_close_an_open_gate() {
        let breaker = CircuitBreaker::default();
        breaker.trip();
        breaker.record_fetch_success();
        assert!(!breaker.is_allowed());
    }

    #[test]
    fn trip_is_visible_through_every_clone() {
        let breaker = CircuitBreaker::shared();
        let other = Arc::clone(&breaker);
        breaker.trip();
        assert!(!other.is_allowed());
    }

    #[test]
    fn process_wide_breaker_is_a_single_instance() {
        assert!(Arc::ptr_eq(
            &CircuitBreaker::process_wide(),
            &CircuitBreaker::process_wide()
        ));
    }

    #[test]
    fn gate_closes_after_cooldown() {
        let breaker = CircuitBreaker::new(Duration::from_millis(10), 1);
        breaker.record_fetch_failure();
        assert!(!breaker.is_allowed());
        std::thread::sleep(Duration::from_millis(15));
        assert!(breaker.is_allowed());
    }
}
