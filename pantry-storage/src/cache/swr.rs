//! Stale-while-revalidate orchestration
//!
//! - age < fresh window: serve, no refresh
//! - fresh window <= age < hard TTL: serve, and schedule at most one
//!   background refresh per key
//! - age >= hard TTL, miss, or undecodable entry: fetch inline and write
//!   the cache in the background on success
//!
//! Failed fetches are never cached.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashSet;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use pantry_core::{FreshnessConfig, PantryError, SearchRequest, SourceFetcher, UpstreamFailure};

use super::freshness::{classify, CacheEntry, CacheLookup, Freshness, LookupSource};
use super::guard::CacheGuard;
use super::key::normalize_cache_key;
use crate::background::spawn_detached;

/// Removes its key from the in-flight set when dropped, panics included.
struct InFlightGuard {
    set: Arc<DashSet<String>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

fn write_entry<T: Serialize>(
    cache: &CacheGuard,
    key: String,
    value: &T,
    ttl: Duration,
) -> Option<JoinHandle<()>> {
    let entry = CacheEntry::new(key.clone(), value);
    match serde_json::to_string(&entry) {
        Ok(raw) => cache.set(key, raw, ttl),
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to encode cache entry");
            None
        }
    }
}

/// Cache-first lookups over a [`SourceFetcher`].
pub struct StaleWhileRevalidate<F: SourceFetcher> {
    cache: CacheGuard,
    fetcher: Arc<F>,
    in_flight: Arc<DashSet<String>>,
    config: FreshnessConfig,
}

impl<F> StaleWhileRevalidate<F>
where
    F: SourceFetcher + 'static,
{
    pub fn new(cache: CacheGuard, fetcher: Arc<F>, config: FreshnessConfig) -> Self {
        Self {
            cache,
            fetcher,
            in_flight: Arc::new(DashSet::new()),
            config,
        }
    }

    pub fn cache(&self) -> &CacheGuard {
        &self.cache
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    /// Keys with a background refresh currently running.
    pub fn refreshes_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    async fn read_entry(&self, key: &str) -> Option<CacheEntry<F::Value>> {
        let raw = self.cache.get(key).await?;
        match serde_json::from_str::<CacheEntry<F::Value>>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %key, error = %e, "Undecodable cache entry, treating as miss");
                None
            }
        }
    }

    /// Look up a search request.
    ///
    /// Cache trouble never surfaces here; only the fetch's own
    /// [`UpstreamFailure`] does.
    pub async fn lookup(
        &self,
        request: &SearchRequest,
    ) -> Result<CacheLookup<F::Value>, UpstreamFailure> {
        let key = normalize_cache_key(request.store, &request.query, request.page);

        let mut source = LookupSource::Miss;
        if let Some(entry) = self.read_entry(&key).await {
            let age = entry.age(Utc::now());
            match classify(age, &self.config) {
                Freshness::Fresh => {
                    debug!(key = %key, age_secs = age.as_secs(), "Fresh cache hit");
                    return Ok(CacheLookup::from_entry(entry, LookupSource::Fresh, false));
                }
                Freshness::Stale => {
                    let scheduled = self.schedule_refresh(key.clone(), request.clone());
                    debug!(key = %key, age_secs = age.as_secs(), scheduled, "Stale cache hit");
                    return Ok(CacheLookup::from_entry(entry, LookupSource::Stale, scheduled));
                }
                Freshness::Expired => {
                    debug!(key = %key, age_secs = age.as_secs(), "Expired cache entry, refetching");
                    source = LookupSource::Expired;
                }
            }
        }

        let value = self.fetcher.fetch(request).await?;
        write_entry(&self.cache, key, &value, self.config.hard_ttl);
        Ok(CacheLookup::fetched(value, source))
    }

    /// Start a detached refresh unless one is already running for `key`.
    fn schedule_refresh(&self, key: String, request: SearchRequest) -> bool {
        if !self.in_flight.insert(key.clone()) {
            return false;
        }

        let in_flight = InFlightGuard {
            set: Arc::clone(&self.in_flight),
            key: key.clone(),
        };
        let fetcher = Arc::clone(&self.fetcher);
        let cache = self.cache.clone();
        let ttl = self.config.hard_ttl;

        spawn_detached("swr_refresh", async move {
            let _in_flight = in_flight;
            let value = fetcher.fetch(&request).await.map_err(PantryError::from)?;
            debug!(key = %key, "Background refresh complete");
            write_entry(&cache, key, &value, ttl);
            Ok(())
        });
        true
    }
}

impl<F: SourceFetcher> std::fmt::Debug for StaleWhileRevalidate<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaleWhileRevalidate")
            .field("cache", &self.cache)
            .field("in_flight", &self.in_flight.len())
            .field("config", &self.config)
            .finish()
    }
}
