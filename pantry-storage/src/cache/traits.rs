//! Cache backend trait and statistics.

use std::time::Duration;

use async_trait::async_trait;

use pantry_core::PantryResult;

/// Key-value store holding serialized cache entries.
///
/// Backends are advisory. Callers reach them only through
/// [`super::CacheGuard`], which bounds every call and absorbs errors.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the raw value stored under `key`.
    async fn get(&self, key: &str) -> PantryResult<Option<String>>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> PantryResult<()>;

    /// Get cache statistics.
    async fn stats(&self) -> PantryResult<CacheStats>;

    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of successful writes.
    pub writes: u64,
    /// Number of entries currently in cache, if the backend knows.
    pub entry_count: Option<u64>,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
