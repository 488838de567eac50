//! Cache entry ages and lookup outcomes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pantry_core::FreshnessConfig;

/// Age class of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Younger than the fresh window; served as is.
    Fresh,
    /// Past the fresh window but inside the hard TTL; served while a
    /// background refresh runs.
    Stale,
    /// At or past the hard TTL; refetched inline.
    Expired,
}

/// Classify an entry age against the configured windows.
pub fn classify(age: Duration, config: &FreshnessConfig) -> Freshness {
    if age < config.fresh_window {
        Freshness::Fresh
    } else if age < config.hard_ttl {
        Freshness::Stale
    } else {
        Freshness::Expired
    }
}

/// What the cache stores for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub key: String,
    pub payload: T,
    pub written_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(key: impl Into<String>, payload: T) -> Self {
        Self::written_at(key, payload, Utc::now())
    }

    pub fn written_at(key: impl Into<String>, payload: T, written_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            payload,
            written_at,
        }
    }

    /// Age at `now`; entries from the future count as brand new.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.written_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Where a lookup's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupSource {
    Fresh,
    Stale,
    /// Entry was past the hard TTL and was refetched.
    Expired,
    /// No usable entry; fetched.
    Miss,
}

impl LookupSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Expired => "expired",
            Self::Miss => "miss",
        }
    }

    pub fn is_cache_hit(&self) -> bool {
        matches!(self, Self::Fresh | Self::Stale)
    }
}

/// Result of a stale-while-revalidate lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup<T> {
    pub value: T,
    pub source: LookupSource,
    /// When the served value was written to the cache, for cache hits.
    pub written_at: Option<DateTime<Utc>>,
    /// Whether this call scheduled the background refresh.
    pub refresh_scheduled: bool,
}

impl<T> CacheLookup<T> {
    pub fn from_entry(entry: CacheEntry<T>, source: LookupSource, refresh_scheduled: bool) -> Self {
        Self {
            value: entry.payload,
            source,
            written_at: Some(entry.written_at),
            refresh_scheduled,
        }
    }

    pub fn fetched(value: T, source: LookupSource) -> Self {
        Self {
            value,
            source,
            written_at: None,
            refresh_scheduled: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        let config = FreshnessConfig {
            fresh_window: Duration::from_secs(10),
            hard_ttl: Duration::from_secs(100),
        };
        assert_eq!(classify(Duration::from_secs(9), &config), Freshness::Fresh);
        assert_eq!(classify(Duration::from_secs(10), &config), Freshness::Stale);
        assert_eq!(classify(Duration::from_secs(99), &config), Freshness::Stale);
        assert_eq!(classify(Duration::from_secs(100), &config), Freshness::Expired);
    }

    #[test]
    fn test_future_entries_are_fresh() {
        let now = Utc::now();
        let entry = CacheEntry::written_at("k", (), now + chrono::Duration::hours(1));
        assert_eq!(entry.age(now), Duration::ZERO);
    }

    #[test]
    fn test_entry_serializes_camel_case() -> Result<(), serde_json::Error> {
        let entry = CacheEntry::new("coles:garlic:1", vec![1, 2]);
        let json = serde_json::to_value(&entry)?;
        assert!(json.get("writtenAt").is_some());
        let back: CacheEntry<Vec<i32>> = serde_json::from_value(json)?;
        assert_eq!(back, entry);
        Ok(())
    }
}
