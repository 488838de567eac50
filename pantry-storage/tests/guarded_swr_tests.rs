//! Stale-while-revalidate over a misbehaving cache and a scripted upstream.

use std::sync::Arc;
use std::time::Duration;

use pantry_core::{CacheGuardConfig, CircuitState, FreshnessConfig, Store};
use pantry_storage::{normalize_cache_key, CacheEntry, CacheGuard, LookupSource, StaleWhileRevalidate};
use pantry_test_utils::fixtures::{garlic_page, search_request};
use pantry_test_utils::{CacheMode, MockCacheBackend, ScriptedTransport, TransportError};
use pantry_upstream::ResilientFetcher;
use tokio::time::Instant;

fn swr(
    backend: Arc<MockCacheBackend>,
    transport: Arc<ScriptedTransport>,
) -> StaleWhileRevalidate<ResilientFetcher> {
    let guard = CacheGuard::new(backend, &CacheGuardConfig::default());
    let fetcher = Arc::new(ResilientFetcher::with_transport(transport));
    StaleWhileRevalidate::new(guard, fetcher, FreshnessConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_hanging_cache_still_serves_and_opens_breaker() {
    let backend = Arc::new(MockCacheBackend::with_mode(CacheMode::Hanging));
    let transport = Arc::new(ScriptedTransport::always(garlic_page()));
    let swr = swr(backend.clone(), transport.clone());
    let request = search_request(Store::Coles, "garlic");

    let started = Instant::now();
    let lookup = swr.lookup(&request).await;
    let lookup = lookup.unwrap_or_else(|e| panic!("lookup failed: {}", e));
    assert_eq!(lookup.source, LookupSource::Miss);
    assert_eq!(lookup.value.results.len(), 2);
    // one bounded read, never the full hour
    assert!(started.elapsed() < Duration::from_secs(2));

    for _ in 0..3 {
        let lookup = swr.lookup(&request).await;
        assert!(lookup.is_ok());
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    assert_eq!(swr.cache().breaker().state(), CircuitState::Open);

    let reads_before = backend.get_calls();
    let started = Instant::now();
    assert!(swr.lookup(&request).await.is_ok());
    assert_eq!(backend.get_calls(), reads_before);
    assert!(started.elapsed() < Duration::from_millis(800));
}

#[tokio::test(start_paused = true)]
async fn test_failing_cache_behaves_as_miss() {
    let backend = Arc::new(MockCacheBackend::with_mode(CacheMode::Failing));
    let transport = Arc::new(ScriptedTransport::always(garlic_page()));
    let swr = swr(backend.clone(), transport.clone());

    let lookup = swr.lookup(&search_request(Store::Woolworths, "garlic")).await;
    assert_eq!(lookup.map(|l| l.source).ok(), Some(LookupSource::Miss));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fresh_entry_written_with_hard_ttl() {
    let backend = Arc::new(MockCacheBackend::new());
    let transport = Arc::new(ScriptedTransport::always(garlic_page()));
    let swr = swr(backend.clone(), transport.clone());
    let request = search_request(Store::Coles, "Garlic");

    assert!(swr.lookup(&request).await.is_ok());
    tokio::time::sleep(Duration::from_millis(10)).await;

    let key = normalize_cache_key(Store::Coles, "garlic", 1);
    assert_eq!(backend.ttl_of(&key), Some(FreshnessConfig::default().hard_ttl));
    let raw = backend.peek(&key).unwrap_or_default();
    let entry: Result<CacheEntry<pantry_core::SearchPage>, _> = serde_json::from_str(&raw);
    assert_eq!(entry.ok().map(|e| e.payload), Some(garlic_page()));

    let lookup = swr.lookup(&request).await;
    assert_eq!(lookup.map(|l| l.source).ok(), Some(LookupSource::Fresh));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_failure_is_not_cached() {
    let backend = Arc::new(MockCacheBackend::new());
    let transport = Arc::new(ScriptedTransport::failing(TransportError::status(403, "forbidden")));
    let swr = swr(backend.clone(), transport.clone());

    let err = swr.lookup(&search_request(Store::Coles, "garlic")).await.err();
    assert_eq!(err.map(|e| e.status), Some(403));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(backend.is_empty());
    assert_eq!(backend.set_calls(), 0);
}
