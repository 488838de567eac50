//! Per-store token bucket
//!
//! The bucket is advisory. When it runs dry the caller waits once for the
//! configured retry delay and then proceeds either way; the upstream's own
//! 429 is the authoritative backstop.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use pantry_core::{RateLimitConfig, Store};

/// Continuous-refill token bucket. Tokens stay within `[0, capacity]`.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    capacity: f64,
    refill_per_sec: f64,
}

impl TokenBucket {
    /// Bucket for a store's first request: that request is granted, so the
    /// bucket starts one short of full.
    pub fn seeded(capacity: u32, refill_per_sec: f64, now: Instant) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            tokens: capacity - 1.0,
            last_refill: now,
            capacity,
            refill_per_sec: refill_per_sec.max(0.0),
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    fn refill(&mut self, now: Instant) {
        let elapsed_ms = now.saturating_duration_since(self.last_refill).as_millis() as f64;
        self.tokens = (self.tokens + elapsed_ms * self.refill_per_sec / 1000.0).min(self.capacity);
        self.last_refill = now;
    }

    /// Refill up to `now`, then take one token if available.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// How a request got past the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Granted,
    GrantedAfterWait,
    /// Bucket still empty after the wait; proceeding anyway.
    Bypassed,
}

impl Admission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::GrantedAfterWait => "granted_after_wait",
            Self::Bypassed => "bypassed",
        }
    }
}

/// Lazily created token buckets, one per store.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<Store, TokenBucket>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    /// Non-blocking acquisition. The first call for a store always succeeds.
    pub fn try_acquire(&self, store: Store) -> bool {
        let now = Instant::now();
        match self.buckets.entry(store) {
            Entry::Occupied(mut entry) => entry.get_mut().try_acquire_at(now),
            Entry::Vacant(entry) => {
                entry.insert(TokenBucket::seeded(
                    self.config.capacity,
                    self.config.refill_per_sec,
                    now,
                ));
                true
            }
        }
    }

    /// Acquire with one delayed re-check; never blocks longer than the
    /// retry delay and never refuses.
    pub async fn acquire(&self, store: Store) -> Admission {
        if self.try_acquire(store) {
            return Admission::Granted;
        }

        debug!(store = %store, delay_ms = self.config.retry_delay.as_millis() as u64, "Token bucket empty, waiting");
        sleep(self.config.retry_delay).await;

        if self.try_acquire(store) {
            return Admission::GrantedAfterWait;
        }

        warn!(store = %store, "Token bucket still empty, proceeding without a token");
        Admission::Bypassed
    }

    /// Current token count for a store, if its bucket exists yet.
    pub fn tokens(&self, store: Store) -> Option<f64> {
        self.buckets.get(&store).map(|bucket| bucket.tokens())
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig::default())
    }

    #[test]
    fn test_seeded_one_below_capacity() {
        let bucket = TokenBucket::seeded(5, 2.0, Instant::now());
        assert_eq!(bucket.tokens(), 4.0);
        assert_eq!(bucket.capacity(), 5.0);
    }

    #[test]
    fn test_refill_uses_elapsed_millis() {
        let start = Instant::now();
        let mut bucket = TokenBucket::seeded(5, 2.0, start);
        for _ in 0..4 {
            assert!(bucket.try_acquire_at(start));
        }
        assert!(!bucket.try_acquire_at(start));

        // 500ms at 2 tokens/s adds exactly one token
        assert!(bucket.try_acquire_at(start + Duration::from_millis(500)));
        assert_eq!(bucket.tokens(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquisition_always_granted() {
        let limiter = RateLimiter::new(RateLimitConfig {
            capacity: 1,
            ..RateLimitConfig::default()
        });
        assert_eq!(limiter.tokens(Store::Coles), None);
        assert_eq!(limiter.acquire(Store::Coles).await, Admission::Granted);
        assert_eq!(limiter.tokens(Store::Coles), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stores_have_independent_buckets() {
        let limiter = limiter();
        for _ in 0..5 {
            assert!(limiter.try_acquire(Store::Woolworths));
        }
        assert!(!limiter.try_acquire(Store::Woolworths));
        assert!(limiter.try_acquire(Store::Coles));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_bucket_waits_once_then_bypasses() {
        let limiter = limiter();
        for _ in 0..5 {
            assert_eq!(limiter.acquire(Store::Coles).await, Admission::Granted);
        }

        let start = Instant::now();
        // 100ms at 2/s only refills 0.2 tokens
        assert_eq!(limiter.acquire(Store::Coles).await, Admission::Bypassed);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_can_be_enough() {
        let limiter = RateLimiter::new(RateLimitConfig {
            capacity: 1,
            refill_per_sec: 20.0,
            ..RateLimitConfig::default()
        });
        assert_eq!(limiter.acquire(Store::Coles).await, Admission::Granted);
        // 100ms at 20/s refills two tokens, capped at capacity 1
        assert_eq!(limiter.acquire(Store::Coles).await, Admission::GrantedAfterWait);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_idle_bucket_saturates_at_capacity(
            capacity in 1u32..50,
            rate in 0.1f64..100.0,
            idle_ms in 0u64..10_000_000,
        ) {
            let start = Instant::now();
            let mut bucket = TokenBucket::seeded(capacity, rate, start);
            bucket.try_acquire_at(start + Duration::from_millis(idle_ms));
            prop_assert!(bucket.tokens() >= 0.0);
            prop_assert!(bucket.tokens() <= f64::from(capacity));
        }

        #[test]
        fn prop_zero_elapsed_depletes_exactly(capacity in 1u32..50, takes in 0u32..100) {
            let now = Instant::now();
            let mut bucket = TokenBucket::seeded(capacity, 2.0, now);
            let later = now + Duration::from_secs(3600);
            bucket.refill(later);
            prop_assert_eq!(bucket.tokens(), f64::from(capacity));

            let granted = (0..takes).filter(|_| bucket.try_acquire_at(later)).count() as u32;
            let expected = takes.min(capacity);
            prop_assert_eq!(granted, expected);
            prop_assert_eq!(bucket.tokens(), f64::from(capacity - expected));
        }
    }
}
