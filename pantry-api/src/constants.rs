//! Constants for PANTRY API

// ============================================================================
// SERVER
// ============================================================================

/// Default bind host
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

// ============================================================================
// CORS
// ============================================================================

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// REQUESTS
// ============================================================================

/// Hard deadline for one inbound request in seconds.
///
/// A resolve stops at the first tier that hits an upstream outage, so the
/// worst case is one tier's full retry budget after a few quick rejections.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 90;

/// Maximum concurrent inbound requests
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 256;

/// Response header carrying the cache outcome of a product search
pub const CACHE_STATUS_HEADER: &str = "x-cache";

// ============================================================================
// SERVER URLs
// ============================================================================

/// Development server URL
pub const DEV_SERVER_URL: &str = "http://localhost:3000";
