//! Default tuning constants for the resolver pipeline.
//!
//! Every value here can be overridden through the matching `PANTRY_*`
//! environment variable read in [`crate::config`].

// ============================================================================
// CACHE GUARD
// ============================================================================

/// Hard bound on a single cache call in milliseconds
pub const DEFAULT_CACHE_TIMEOUT_MS: u64 = 800;

/// Consecutive cache failures that open the breaker
pub const DEFAULT_CIRCUIT_FAILURE_THRESHOLD: u32 = 3;

/// Seconds the breaker stays open before a probe is allowed
pub const DEFAULT_CIRCUIT_COOLDOWN_SECS: u64 = 60;

// ============================================================================
// FRESHNESS
// ============================================================================

/// Entries younger than this are served without a refresh (6 hours)
pub const DEFAULT_FRESH_WINDOW_SECS: u64 = 6 * 3600;

/// Entries older than this are refetched inline (72 hours)
pub const DEFAULT_HARD_TTL_SECS: u64 = 72 * 3600;

// ============================================================================
// RATE LIMITING
// ============================================================================

/// Token bucket capacity per store
pub const DEFAULT_BUCKET_CAPACITY: u32 = 5;

/// Tokens added per second per store
pub const DEFAULT_BUCKET_REFILL_PER_SEC: f64 = 2.0;

/// Wait before the single bucket re-check in milliseconds
pub const DEFAULT_BUCKET_RETRY_DELAY_MS: u64 = 100;

// ============================================================================
// UPSTREAM
// ============================================================================

/// Attempts in the normal retry loop
pub const DEFAULT_UPSTREAM_MAX_ATTEMPTS: u32 = 3;

/// Deadline for one upstream attempt in milliseconds
pub const DEFAULT_UPSTREAM_ATTEMPT_TIMEOUT_MS: u64 = 6_000;

/// First backoff delay in milliseconds; doubles per attempt
pub const DEFAULT_UPSTREAM_BACKOFF_BASE_MS: u64 = 1_500;

/// Delay before the extra attempt that follows a 429, in milliseconds
pub const DEFAULT_RATE_LIMIT_RETRY_DELAY_MS: u64 = 700;

/// Results requested per upstream page
pub const DEFAULT_PAGE_SIZE: u32 = 20;
