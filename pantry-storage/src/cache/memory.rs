//! Process-local cache backend with per-entry expiry.
//!
//! Expired entries are dropped when read and swept on every write, so keys
//! that are never read again do not accumulate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use pantry_core::PantryResult;

use super::traits::{CacheBackend, CacheStats};

/// Expiry instant; `None` when the TTL is too large to represent.
type Expiry = Option<Instant>;

fn is_live(expires: &Expiry, now: Instant) -> bool {
    expires.map_or(true, |at| at > now)
}

/// In-memory backend used when no network cache is configured.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: DashMap<String, (String, Expiry)>,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> PantryResult<Option<String>> {
        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if is_live(&entry.1, now) => Some(entry.0.clone()),
            _ => None,
        };
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.entries.remove_if(key, |_, (_, expires)| !is_live(expires, now));
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> PantryResult<()> {
        let now = Instant::now();
        self.entries.retain(|_, (_, expires)| is_live(expires, now));
        self.entries
            .insert(key.to_string(), (value, now.checked_add(ttl)));
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn stats(&self) -> PantryResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            entry_count: Some(self.entries.len() as u64),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
