//! Source-of-truth fetcher seam.
//!
//! The stale-while-revalidate orchestrator only knows how to turn a
//! [`SearchRequest`] into a value through this trait, which keeps the cache
//! layer independent of the HTTP client behind it.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::UpstreamFailure;
use crate::product::SearchRequest;

/// Fetches the authoritative value for a search request.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Value cached on success.
    type Value: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Fetch from the source. Failures are already normalized and are
    /// never written to the cache.
    async fn fetch(&self, request: &SearchRequest) -> Result<Self::Value, UpstreamFailure>;
}
