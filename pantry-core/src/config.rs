//! Configuration types
//!
//! Every section has a `Default` built from [`crate::constants`] and a
//! `from_env` constructor reading `PANTRY_*` variables. [`ResolverConfig::validate`]
//! is run once at startup; an invalid configuration is fatal.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::constants::*;
use crate::error::{ConfigError, PantryError, PantryResult};
use crate::product::{Store, StoreEndpoint};

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn invalid(field: &str, value: impl std::fmt::Debug, reason: &str) -> PantryError {
    PantryError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: format!("{:?}", value),
        reason: reason.to_string(),
    })
}

// ============================================================================
// CACHE GUARD
// ============================================================================

/// Circuit breaker and timeout settings for the cache guard.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheGuardConfig {
    /// Bound on every cache call; running past it counts as a failure.
    pub timeout: Duration,
    /// Consecutive failures that open the breaker.
    pub failure_threshold: u32,
    /// How long the breaker stays open before a probe is allowed.
    pub cooldown: Duration,
}

impl Default for CacheGuardConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_CACHE_TIMEOUT_MS),
            failure_threshold: DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
            cooldown: Duration::from_secs(DEFAULT_CIRCUIT_COOLDOWN_SECS),
        }
    }
}

impl CacheGuardConfig {
    /// # Environment Variables
    /// - `PANTRY_CACHE_TIMEOUT_MS` (default: 800)
    /// - `PANTRY_CIRCUIT_FAILURE_THRESHOLD` (default: 3)
    /// - `PANTRY_CIRCUIT_COOLDOWN_SECS` (default: 60)
    pub fn from_env() -> Self {
        Self {
            timeout: Duration::from_millis(env_or(
                "PANTRY_CACHE_TIMEOUT_MS",
                DEFAULT_CACHE_TIMEOUT_MS,
            )),
            failure_threshold: env_or(
                "PANTRY_CIRCUIT_FAILURE_THRESHOLD",
                DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
            ),
            cooldown: Duration::from_secs(env_or(
                "PANTRY_CIRCUIT_COOLDOWN_SECS",
                DEFAULT_CIRCUIT_COOLDOWN_SECS,
            )),
        }
    }
}

// ============================================================================
// FRESHNESS
// ============================================================================

/// Age thresholds for stale-while-revalidate.
#[derive(Debug, Clone, PartialEq)]
pub struct FreshnessConfig {
    pub fresh_window: Duration,
    /// Also used as the TTL handed to the cache backend on write.
    pub hard_ttl: Duration,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            fresh_window: Duration::from_secs(DEFAULT_FRESH_WINDOW_SECS),
            hard_ttl: Duration::from_secs(DEFAULT_HARD_TTL_SECS),
        }
    }
}

impl FreshnessConfig {
    /// # Environment Variables
    /// - `PANTRY_FRESH_WINDOW_SECS` (default: 21600)
    /// - `PANTRY_HARD_TTL_SECS` (default: 259200)
    pub fn from_env() -> Self {
        Self {
            fresh_window: Duration::from_secs(env_or(
                "PANTRY_FRESH_WINDOW_SECS",
                DEFAULT_FRESH_WINDOW_SECS,
            )),
            hard_ttl: Duration::from_secs(env_or("PANTRY_HARD_TTL_SECS", DEFAULT_HARD_TTL_SECS)),
        }
    }
}

// ============================================================================
// RATE LIMIT
// ============================================================================

/// Per-store token bucket settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub capacity: u32,
    pub refill_per_sec: f64,
    /// Wait before the one re-check after the bucket runs dry.
    pub retry_delay: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUCKET_CAPACITY,
            refill_per_sec: DEFAULT_BUCKET_REFILL_PER_SEC,
            retry_delay: Duration::from_millis(DEFAULT_BUCKET_RETRY_DELAY_MS),
        }
    }
}

impl RateLimitConfig {
    /// # Environment Variables
    /// - `PANTRY_BUCKET_CAPACITY` (default: 5)
    /// - `PANTRY_BUCKET_REFILL_PER_SEC` (default: 2.0)
    /// - `PANTRY_BUCKET_RETRY_DELAY_MS` (default: 100)
    pub fn from_env() -> Self {
        Self {
            capacity: env_or("PANTRY_BUCKET_CAPACITY", DEFAULT_BUCKET_CAPACITY),
            refill_per_sec: env_or("PANTRY_BUCKET_REFILL_PER_SEC", DEFAULT_BUCKET_REFILL_PER_SEC),
            retry_delay: Duration::from_millis(env_or(
                "PANTRY_BUCKET_RETRY_DELAY_MS",
                DEFAULT_BUCKET_RETRY_DELAY_MS,
            )),
        }
    }
}

// ============================================================================
// UPSTREAM
// ============================================================================

/// Upstream product-search settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub api_key: Option<SecretString>,
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff_base: Duration,
    /// Delay before the one extra attempt that follows a 429.
    pub rate_limit_delay: Duration,
    pub page_size: u32,
    pub endpoint_overrides: HashMap<Store, StoreEndpoint>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            max_attempts: DEFAULT_UPSTREAM_MAX_ATTEMPTS,
            attempt_timeout: Duration::from_millis(DEFAULT_UPSTREAM_ATTEMPT_TIMEOUT_MS),
            backoff_base: Duration::from_millis(DEFAULT_UPSTREAM_BACKOFF_BASE_MS),
            rate_limit_delay: Duration::from_millis(DEFAULT_RATE_LIMIT_RETRY_DELAY_MS),
            page_size: DEFAULT_PAGE_SIZE,
            endpoint_overrides: HashMap::new(),
        }
    }
}

impl UpstreamConfig {
    /// # Environment Variables
    /// - `PANTRY_UPSTREAM_API_KEY` (required to serve traffic)
    /// - `PANTRY_UPSTREAM_MAX_ATTEMPTS` (default: 3)
    /// - `PANTRY_UPSTREAM_TIMEOUT_MS` (default: 6000)
    /// - `PANTRY_UPSTREAM_BACKOFF_MS` (default: 1500)
    /// - `PANTRY_RATE_LIMIT_DELAY_MS` (default: 700)
    /// - `PANTRY_PAGE_SIZE` (default: 20)
    /// - `PANTRY_<STORE>_HOST`, `PANTRY_<STORE>_PATH` per-store overrides
    pub fn from_env() -> Self {
        let mut endpoint_overrides = HashMap::new();
        for store in Store::ALL {
            let prefix = format!("PANTRY_{}", store.as_str().to_ascii_uppercase());
            let host = std::env::var(format!("{}_HOST", prefix)).ok();
            let path = std::env::var(format!("{}_PATH", prefix)).ok();
            if host.is_none() && path.is_none() {
                continue;
            }
            let default = store.default_endpoint();
            endpoint_overrides.insert(
                store,
                StoreEndpoint {
                    host: host.unwrap_or(default.host),
                    path: path.unwrap_or(default.path),
                },
            );
        }

        Self {
            api_key: std::env::var("PANTRY_UPSTREAM_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .map(|k| SecretString::new(k.into())),
            max_attempts: env_or("PANTRY_UPSTREAM_MAX_ATTEMPTS", DEFAULT_UPSTREAM_MAX_ATTEMPTS),
            attempt_timeout: Duration::from_millis(env_or(
                "PANTRY_UPSTREAM_TIMEOUT_MS",
                DEFAULT_UPSTREAM_ATTEMPT_TIMEOUT_MS,
            )),
            backoff_base: Duration::from_millis(env_or(
                "PANTRY_UPSTREAM_BACKOFF_MS",
                DEFAULT_UPSTREAM_BACKOFF_BASE_MS,
            )),
            rate_limit_delay: Duration::from_millis(env_or(
                "PANTRY_RATE_LIMIT_DELAY_MS",
                DEFAULT_RATE_LIMIT_RETRY_DELAY_MS,
            )),
            page_size: env_or("PANTRY_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            endpoint_overrides,
        }
    }

    /// Endpoint for a store, honoring overrides.
    pub fn endpoint(&self, store: Store) -> StoreEndpoint {
        self.endpoint_overrides
            .get(&store)
            .cloned()
            .unwrap_or_else(|| store.default_endpoint())
    }

    /// The API key, or a configuration error if it is missing.
    pub fn require_api_key(&self) -> PantryResult<&SecretString> {
        self.api_key.as_ref().ok_or_else(|| {
            PantryError::Config(ConfigError::MissingRequired {
                field: "PANTRY_UPSTREAM_API_KEY".to_string(),
            })
        })
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Master configuration for one resolver instance.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    pub cache: CacheGuardConfig,
    pub freshness: FreshnessConfig,
    pub rate_limit: RateLimitConfig,
    pub upstream: UpstreamConfig,
}

impl ResolverConfig {
    pub fn from_env() -> Self {
        Self {
            cache: CacheGuardConfig::from_env(),
            freshness: FreshnessConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            upstream: UpstreamConfig::from_env(),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - all durations are positive
    /// - fresh_window < hard_ttl
    /// - failure_threshold, capacity, max_attempts and page_size > 0
    /// - refill rate is a positive finite number
    pub fn validate(&self) -> PantryResult<()> {
        if self.cache.timeout.is_zero() {
            return Err(invalid("cache.timeout", self.cache.timeout, "must be positive"));
        }
        if self.cache.failure_threshold == 0 {
            return Err(invalid(
                "cache.failure_threshold",
                self.cache.failure_threshold,
                "must be greater than 0",
            ));
        }
        if self.cache.cooldown.is_zero() {
            return Err(invalid("cache.cooldown", self.cache.cooldown, "must be positive"));
        }

        if self.freshness.fresh_window.is_zero() {
            return Err(invalid(
                "freshness.fresh_window",
                self.freshness.fresh_window,
                "must be positive",
            ));
        }
        if self.freshness.fresh_window >= self.freshness.hard_ttl {
            return Err(invalid(
                "freshness.fresh_window",
                self.freshness.fresh_window,
                "must be shorter than freshness.hard_ttl",
            ));
        }

        if self.rate_limit.capacity == 0 {
            return Err(invalid(
                "rate_limit.capacity",
                self.rate_limit.capacity,
                "must be greater than 0",
            ));
        }
        if !self.rate_limit.refill_per_sec.is_finite() || self.rate_limit.refill_per_sec <= 0.0 {
            return Err(invalid(
                "rate_limit.refill_per_sec",
                self.rate_limit.refill_per_sec,
                "must be a positive number",
            ));
        }

        if self.upstream.max_attempts == 0 {
            return Err(invalid(
                "upstream.max_attempts",
                self.upstream.max_attempts,
                "must be greater than 0",
            ));
        }
        if self.upstream.attempt_timeout.is_zero() {
            return Err(invalid(
                "upstream.attempt_timeout",
                self.upstream.attempt_timeout,
                "must be positive",
            ));
        }
        if self.upstream.page_size == 0 {
            return Err(invalid(
                "upstream.page_size",
                self.upstream.page_size,
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}
