//! PANTRY Storage
//!
//! Shared cache access for product searches: a circuit-broken,
//! time-bounded guard over a key-value backend, and the
//! stale-while-revalidate orchestrator that serves from it.

pub mod background;
pub mod cache;

pub use background::spawn_detached;
pub use cache::{
    classify, normalize_cache_key, CacheBackend, CacheEntry, CacheGuard, CacheLookup,
    CacheStats, CircuitBreaker, Freshness, InMemoryCacheBackend, LookupSource, RestKvBackend,
    StaleWhileRevalidate,
};
