//! Circuit breaker for the cache.
//!
//! CLOSED -> (threshold consecutive failures) -> OPEN
//! OPEN -> (cooldown elapsed) -> HALF_OPEN with a single probe
//! HALF_OPEN -> success -> CLOSED, failure -> OPEN with the cooldown restarted

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use pantry_core::{CacheGuardConfig, CircuitState};

#[derive(Debug)]
struct BreakerRecord {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    probe_started_at: Option<Instant>,
}

/// Process-local circuit breaker.
pub struct CircuitBreaker {
    record: Mutex<BreakerRecord>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            record: Mutex::new(BreakerRecord {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure_at: None,
                probe_started_at: None,
            }),
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    pub fn from_config(config: &CacheGuardConfig) -> Self {
        Self::new(config.failure_threshold, config.cooldown)
    }

    // The record is plain data, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, BreakerRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Whether a cache call may go ahead now.
    ///
    /// The first call after the cooldown becomes the half-open probe; other
    /// callers are refused until the probe reports back. A probe that never
    /// reports back is replaced after another cooldown.
    pub fn allow(&self) -> bool {
        let now = Instant::now();
        let mut record = self.lock();
        match record.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled = record
                    .last_failure_at
                    .map(|at| now.saturating_duration_since(at) >= self.cooldown)
                    .unwrap_or(true);
                if cooled {
                    record.state = CircuitState::HalfOpen;
                    record.probe_started_at = Some(now);
                    info!("Cache circuit half-open, probing");
                }
                cooled
            }
            CircuitState::HalfOpen => {
                let stale_probe = record
                    .probe_started_at
                    .map(|at| now.saturating_duration_since(at) >= self.cooldown)
                    .unwrap_or(true);
                if stale_probe {
                    record.probe_started_at = Some(now);
                }
                stale_probe
            }
        }
    }

    pub fn record_success(&self) {
        let mut record = self.lock();
        if record.state != CircuitState::Closed {
            info!("Cache circuit closed");
        }
        record.state = CircuitState::Closed;
        record.consecutive_failures = 0;
        record.probe_started_at = None;
    }

    pub fn record_failure(&self) {
        let mut record = self.lock();
        record.consecutive_failures = record.consecutive_failures.saturating_add(1);
        record.last_failure_at = Some(Instant::now());
        record.probe_started_at = None;

        match record.state {
            CircuitState::HalfOpen => {
                record.state = CircuitState::Open;
                warn!("Cache probe failed, circuit re-opened");
            }
            CircuitState::Closed if record.consecutive_failures >= self.failure_threshold => {
                record.state = CircuitState::Open;
                warn!(
                    failures = record.consecutive_failures,
                    cooldown_secs = self.cooldown.as_secs(),
                    "Cache circuit opened"
                );
            }
            _ => {}
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let record = self.lock();
        f.debug_struct("CircuitBreaker")
            .field("state", &record.state)
            .field("consecutive_failures", &record.consecutive_failures)
            .field("failure_threshold", &self.failure_threshold)
            .field("cooldown", &self.cooldown)
            .finish()
    }
}
