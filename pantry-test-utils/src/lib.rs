//! PANTRY Test Utilities
//!
//! Shared test infrastructure for the PANTRY workspace:
//! - Mock cache backend with switchable failure modes
//! - Scripted upstream transport
//! - Fixtures for common products and requests
//! - Proptest generators

pub use pantry_core::{
    FailureKind, IngredientSpec, PantryError, PantryResult, Product, SearchPage, SearchRequest,
    Store, UpstreamFailure,
};
pub use pantry_storage::{CacheBackend, CacheStats};
pub use pantry_upstream::{TransportError, UpstreamTransport};

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pantry_core::CacheError;

// ============================================================================
// MOCK CACHE BACKEND
// ============================================================================

/// How [`MockCacheBackend`] answers calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CacheMode {
    Healthy = 0,
    /// Every call returns [`CacheError::Unavailable`].
    Failing = 1,
    /// Every call sleeps for an hour before answering.
    Hanging = 2,
}

impl CacheMode {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Failing,
            2 => Self::Hanging,
            _ => Self::Healthy,
        }
    }
}

/// In-process cache backend whose failure mode can be flipped mid-test.
///
/// TTLs are recorded but not enforced.
#[derive(Debug, Default)]
pub struct MockCacheBackend {
    entries: Mutex<HashMap<String, (String, Duration)>>,
    mode: AtomicU8,
    gets: AtomicU64,
    sets: AtomicU64,
}

impl MockCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: CacheMode) -> Self {
        let backend = Self::new();
        backend.set_mode(mode);
        backend
    }

    pub fn set_mode(&self, mode: CacheMode) {
        self.mode.store(mode as u8, Ordering::SeqCst);
    }

    pub fn mode(&self) -> CacheMode {
        CacheMode::from_u8(self.mode.load(Ordering::SeqCst))
    }

    /// Calls to `get` that reached the backend, in any mode.
    pub fn get_calls(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    /// Calls to `set` that reached the backend, in any mode.
    pub fn set_calls(&self) -> u64 {
        self.sets.load(Ordering::SeqCst)
    }

    /// Stored value, bypassing the mode.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).map(|(v, _)| v.clone()))
    }

    /// TTL the value for `key` was written with.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).map(|(_, ttl)| *ttl))
    }

    /// Store a value directly, bypassing the mode.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), (value.into(), Duration::from_secs(3600)));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn gate(&self) -> PantryResult<()> {
        match self.mode() {
            CacheMode::Healthy => Ok(()),
            CacheMode::Failing => Err(CacheError::Unavailable {
                reason: "mock backend failing".to_string(),
            }
            .into()),
            CacheMode::Hanging => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CacheBackend for MockCacheBackend {
    async fn get(&self, key: &str) -> PantryResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> PantryResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PantryError::Cache(CacheError::LockPoisoned))?;
        entries.insert(key.to_string(), (value, ttl));
        Ok(())
    }

    async fn stats(&self) -> PantryResult<CacheStats> {
        Ok(CacheStats {
            entry_count: Some(self.len() as u64),
            ..CacheStats::default()
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ============================================================================
// SCRIPTED TRANSPORT
// ============================================================================

/// Upstream transport that replays a queue of canned responses.
///
/// Once the queue is empty every call returns the fallback response.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<SearchPage, TransportError>>>,
    fallback: Result<SearchPage, TransportError>,
    latency: Duration,
    calls: AtomicU64,
    queries: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<SearchPage, TransportError>>,
    {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: Ok(SearchPage::default()),
            latency: Duration::ZERO,
            calls: AtomicU64::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every call answers with `page`.
    pub fn always(page: SearchPage) -> Self {
        Self::new(std::iter::empty()).with_fallback(Ok(page))
    }

    /// Every call fails with `err`.
    pub fn failing(err: TransportError) -> Self {
        Self::new(std::iter::empty()).with_fallback(Err(err))
    }

    pub fn with_fallback(mut self, fallback: Result<SearchPage, TransportError>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries seen, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl UpstreamTransport for ScriptedTransport {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(request.query.clone());
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_store() -> impl Strategy<Value = Store> {
        prop::sample::select(Store::ALL.to_vec())
    }

    /// One to four lowercase words.
    pub fn arb_query() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{2,8}", 1..5).prop_map(|words| words.join(" "))
    }

    pub fn arb_size_string() -> impl Strategy<Value = String> {
        (1u32..2000, prop::sample::select(vec!["g", "kg", "ml", "L", "each"]))
            .prop_map(|(n, unit)| format!("{}{}", n, unit))
    }

    pub fn arb_product() -> impl Strategy<Value = Product> {
        (
            arb_query(),
            prop::option::of("[A-Za-z ]{3,20}"),
            prop::option::of(arb_size_string()),
            prop::option::of(0.5f64..50.0),
        )
            .prop_map(|(name, category, size, price)| Product {
                name,
                category,
                size_string: size,
                price,
                url: None,
            })
    }

    pub fn arb_search_page() -> impl Strategy<Value = SearchPage> {
        prop::collection::vec(arb_product(), 0..8).prop_map(SearchPage::from_products)
    }

    pub fn arb_search_request() -> impl Strategy<Value = SearchRequest> {
        (arb_store(), arb_query(), 1u32..5).prop_filter_map("valid request", |(store, q, page)| {
            SearchRequest::new(store, q, page, 20).ok()
        })
    }

    /// Transport errors the fetcher retries.
    pub fn arb_retryable_error() -> impl Strategy<Value = TransportError> {
        prop_oneof![
            Just(TransportError::Timeout),
            Just(TransportError::Connect("refused".to_string())),
            prop::sample::select(vec![500u16, 502, 503, 504])
                .prop_map(|s| TransportError::status(s, "upstream error")),
        ]
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;

    pub fn search_request(store: Store, query: &str) -> SearchRequest {
        match SearchRequest::new(store, query, 1, 20) {
            Ok(request) => request,
            Err(e) => panic!("fixture request for {:?} is invalid: {}", query, e),
        }
    }

    pub fn garlic_bulb() -> Product {
        Product::named("Coles Australian Garlic Bulb")
            .with_category("Fruit & Vegetables")
            .with_size("each")
            .with_price(1.2)
    }

    pub fn garlic_paste() -> Product {
        Product::named("Coles Crushed Garlic Paste Jar")
            .with_category("Pantry")
            .with_size("200g")
            .with_price(3.5)
    }

    pub fn full_cream_milk() -> Product {
        Product::named("Woolworths Full Cream Milk 2L")
            .with_category("Dairy, Eggs & Fridge")
            .with_size("2L")
            .with_price(3.1)
    }

    pub fn garlic_page() -> SearchPage {
        SearchPage::from_products(vec![garlic_paste(), garlic_bulb()])
    }

    pub fn empty_page() -> SearchPage {
        SearchPage::default()
    }

    pub fn garlic_spec() -> IngredientSpec {
        IngredientSpec::named("garlic")
            .with_required_words(["garlic"])
            .whole_food(true)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_mock_cache_modes() {
        let backend = MockCacheBackend::new();
        assert!(backend.set("k", "v".to_string(), Duration::from_secs(5)).await.is_ok());
        assert_eq!(backend.get("k").await.ok().flatten(), Some("v".to_string()));
        assert_eq!(backend.ttl_of("k"), Some(Duration::from_secs(5)));

        backend.set_mode(CacheMode::Failing);
        assert!(backend.get("k").await.is_err());
        assert_eq!(backend.get_calls(), 2);
        assert_eq!(backend.peek("k"), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_scripted_transport_replays_then_falls_back() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Timeout)])
            .with_fallback(Ok(fixtures::garlic_page()));
        let request = fixtures::search_request(Store::Coles, "garlic");

        assert_eq!(transport.search(&request).await, Err(TransportError::Timeout));
        let page = transport.search(&request).await;
        assert_eq!(page.map(|p| p.results.len()), Ok(2));
        assert_eq!(transport.calls(), 2);
        assert_eq!(transport.queries(), vec!["garlic", "garlic"]);
    }
}
