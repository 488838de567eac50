//! Cache layer: backends, the breaker-guarded facade, and
//! stale-while-revalidate on top.

pub mod breaker;
pub mod freshness;
pub mod guard;
pub mod key;
pub mod memory;
pub mod rest_kv;
pub mod swr;
pub mod traits;

pub use breaker::CircuitBreaker;
pub use freshness::{classify, CacheEntry, CacheLookup, Freshness, LookupSource};
pub use guard::CacheGuard;
pub use key::normalize_cache_key;
pub use memory::InMemoryCacheBackend;
pub use rest_kv::RestKvBackend;
pub use swr::StaleWhileRevalidate;
pub use traits::{CacheBackend, CacheStats};
