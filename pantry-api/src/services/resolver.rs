//! Product resolution: ingredient spec in, best matching product out.
//!
//! Every query tier goes through the stale-while-revalidate cache, and every
//! candidate page goes through the scorer. Tiers are tried in order until
//! one yields an accepted product.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use pantry_core::{
    FailureKind, HealthCheck, IngredientSpec, PantryResult, Product, ResolverConfig, SearchPage,
    SearchRequest, Store, UpstreamFailure,
};
use pantry_match::{best_match, build_query_set};
use pantry_storage::{CacheBackend, CacheGuard, CacheLookup, StaleWhileRevalidate};
use pantry_upstream::ResilientFetcher;

use crate::telemetry::metrics;

/// Outcome of resolving one ingredient at one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// An accepted product was found.
    Resolved {
        product: Product,
        /// Scorer output in [0, 1].
        score: f64,
        /// Query that produced the product.
        query: String,
        /// Cache outcome of that query.
        cache: String,
        #[serde(rename = "queriesTried")]
        queries_tried: Vec<String>,
    },
    /// Every tier was exhausted without an accepted product. Substitution is
    /// left to the caller.
    Unresolved {
        #[serde(rename = "queriesTried")]
        queries_tried: Vec<String>,
        #[serde(rename = "candidatesSeen")]
        candidates_seen: usize,
    },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved { .. } => "resolved",
            Self::Unresolved { .. } => "unresolved",
        }
    }
}

/// One resolver instance: cache guard, breaker, buckets and in-flight set.
pub struct ProductResolver {
    swr: StaleWhileRevalidate<ResilientFetcher>,
    page_size: u32,
}

impl ProductResolver {
    pub fn new(swr: StaleWhileRevalidate<ResilientFetcher>, page_size: u32) -> Self {
        Self { swr, page_size }
    }

    /// Resolver over the HTTP transport. Fails on invalid configuration or a
    /// missing API key.
    pub fn from_config(config: &ResolverConfig, backend: Arc<dyn CacheBackend>) -> PantryResult<Self> {
        config.validate()?;
        let fetcher = ResilientFetcher::from_config(config)?;
        Ok(Self::with_fetcher(config, backend, fetcher))
    }

    /// Resolver over an already built fetcher.
    pub fn with_fetcher(
        config: &ResolverConfig,
        backend: Arc<dyn CacheBackend>,
        fetcher: ResilientFetcher,
    ) -> Self {
        let guard = CacheGuard::new(backend, &config.cache);
        let page_size = fetcher.page_size();
        let swr = StaleWhileRevalidate::new(guard, Arc::new(fetcher), config.freshness.clone());
        Self::new(swr, page_size)
    }

    pub fn cache(&self) -> &CacheGuard {
        self.swr.cache()
    }

    /// One page of search results through the cache.
    pub async fn search(
        &self,
        store: Store,
        query: &str,
        page: u32,
    ) -> Result<CacheLookup<SearchPage>, UpstreamFailure> {
        let request = SearchRequest::new(store, query, page, self.page_size)?;
        let started = Instant::now();
        let result = self.swr.lookup(&request).await;
        let elapsed = started.elapsed().as_secs_f64();

        if let Some(metrics) = metrics() {
            match &result {
                Ok(lookup) => {
                    metrics.record_cache_lookup(store, lookup.source.as_str());
                    if !lookup.source.is_cache_hit() {
                        metrics.record_upstream_fetch(store, "success", elapsed);
                    }
                }
                Err(failure) => {
                    metrics.record_cache_lookup(store, "miss");
                    metrics.record_upstream_fetch(store, failure.kind.as_str(), elapsed);
                }
            }
            metrics.set_circuit_state(self.swr.cache().breaker().state());
        }
        result
    }

    /// Walk the query tiers for `spec` until one yields an accepted product.
    ///
    /// Rate limiting, configuration failures and upstream outages (timeouts,
    /// unreachable host, 5xx) stop the walk, so a dead upstream costs one
    /// tier's retry budget rather than every tier's. Failures specific to one
    /// query skip to the next tier, and surface only if no tier succeeded.
    pub async fn resolve(
        &self,
        store: Store,
        spec: &IngredientSpec,
    ) -> Result<Resolution, UpstreamFailure> {
        let queries = build_query_set(spec, store).ordered();
        let mut queries_tried = Vec::with_capacity(queries.len());
        let mut candidates_seen = 0;
        let mut last_failure = None;
        let mut any_succeeded = false;

        for query in queries {
            queries_tried.push(query.clone());
            let lookup = match self.search(store, &query, 1).await {
                Ok(lookup) => lookup,
                Err(failure)
                    if failure.is_rate_limited()
                        || failure.is_outage()
                        || failure.kind == FailureKind::Configuration =>
                {
                    warn!(store = %store, query = %query, error = %failure, "Upstream unavailable, stopping resolve");
                    self.record_outcome(store, "failed");
                    return Err(failure);
                }
                Err(failure) => {
                    warn!(store = %store, query = %query, error = %failure, "Query tier failed, trying next");
                    last_failure = Some(failure);
                    continue;
                }
            };
            any_succeeded = true;
            candidates_seen += lookup.value.results.len();

            if let Some(best) = best_match(&lookup.value.results, spec) {
                info!(
                    store = %store,
                    ingredient = %spec.clean_name,
                    query = %query,
                    product = %best.product.name,
                    score = best.result.score,
                    "Ingredient resolved"
                );
                self.record_outcome(store, "resolved");
                return Ok(Resolution::Resolved {
                    product: best.product,
                    score: best.result.score,
                    query,
                    cache: lookup.source.as_str().to_string(),
                    queries_tried,
                });
            }
            debug!(store = %store, query = %query, candidates = lookup.value.results.len(), "No accepted product");
        }

        if let (false, Some(failure)) = (any_succeeded, last_failure) {
            self.record_outcome(store, "failed");
            return Err(failure);
        }

        info!(
            store = %store,
            ingredient = %spec.clean_name,
            tiers = queries_tried.len(),
            "Ingredient unresolved"
        );
        self.record_outcome(store, "unresolved");
        Ok(Resolution::Unresolved {
            queries_tried,
            candidates_seen,
        })
    }

    fn record_outcome(&self, store: Store, outcome: &str) {
        if let Some(metrics) = metrics() {
            metrics.record_match_outcome(store, outcome);
        }
    }

    /// Cache and upstream health for the readiness probe.
    pub fn health(&self) -> Vec<HealthCheck> {
        let cache = self.swr.cache();
        if let Some(metrics) = metrics() {
            metrics.set_circuit_state(cache.breaker().state());
        }

        let limiter = self.swr.fetcher().limiter();
        let upstream = Store::ALL.iter().fold(HealthCheck::healthy("upstream"), |check, store| {
            let tokens = limiter
                .tokens(*store)
                .unwrap_or(limiter.config().capacity as f64);
            check.with_metadata(format!("{}_tokens", store.as_str()), tokens.into())
        });

        vec![cache.health(), upstream]
    }
}

impl std::fmt::Debug for ProductResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductResolver")
            .field("swr", &self.swr)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::HealthStatus;
    use pantry_match::build_spec;
    use pantry_storage::InMemoryCacheBackend;
    use pantry_test_utils::{ScriptedTransport, TransportError};
    use std::time::Duration;

    fn resolver(transport: Arc<ScriptedTransport>) -> ProductResolver {
        let config = ResolverConfig::default();
        let fetcher = ResilientFetcher::with_transport(transport);
        ProductResolver::with_fetcher(&config, Arc::new(InMemoryCacheBackend::new()), fetcher)
    }

    fn page(names: &[&str]) -> SearchPage {
        SearchPage::from_products(names.iter().map(|n| Product::named(*n)).collect())
    }

    #[tokio::test(start_paused = true)]
    async fn test_garlic_resolves_to_bulb() {
        let transport = Arc::new(ScriptedTransport::always(page(&[
            "Garlic Prawns Marinade",
            "Garlic Bulb 3 Pack",
        ])));
        let resolver = resolver(transport.clone());

        let resolution = resolver.resolve(Store::Coles, &build_spec("garlic")).await;
        match resolution {
            Ok(Resolution::Resolved { product, query, cache, .. }) => {
                assert_eq!(product.name, "Garlic Bulb 3 Pack");
                assert_eq!(query, "coles garlic");
                assert_eq!(cache, "miss");
            }
            other => panic!("expected resolved, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_through_to_next_tier() {
        let transport = Arc::new(
            ScriptedTransport::new(vec![Ok(SearchPage::default())])
                .with_fallback(Ok(page(&["Woolworths Full Cream Milk 2L"]))),
        );
        let resolver = resolver(transport.clone());

        let resolution = resolver
            .resolve(Store::Coles, &build_spec("milk_regular_cow"))
            .await;
        match resolution {
            Ok(Resolution::Resolved { query, queries_tried, .. }) => {
                assert_eq!(query, "coles milk");
                assert_eq!(queries_tried, vec!["coles full cream milk", "coles milk"]);
            }
            other => panic!("expected resolved, got {:?}", other),
        }
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_tiers_are_unresolved() {
        let transport = Arc::new(ScriptedTransport::always(page(&[
            "Cheddar Cheese Block",
            "Salted Butter 250g",
        ])));
        let resolver = resolver(transport.clone());

        let resolution = resolver
            .resolve(Store::Coles, &build_spec("milk_regular_cow"))
            .await;
        match resolution {
            Ok(Resolution::Unresolved { queries_tried, candidates_seen }) => {
                assert_eq!(
                    queries_tried,
                    vec![
                        "coles full cream milk",
                        "coles milk",
                        "coles full cream",
                        "coles full"
                    ]
                );
                assert_eq!(candidates_seen, 8);
            }
            other => panic!("expected unresolved, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_resolve_is_served_from_cache() {
        let transport = Arc::new(ScriptedTransport::always(page(&["Garlic Bulb 3 Pack"])));
        let resolver = resolver(transport.clone());
        let spec = build_spec("garlic");

        assert!(resolver.resolve(Store::Coles, &spec).await.is_ok());
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        match resolver.resolve(Store::Coles, &spec).await {
            Ok(Resolution::Resolved { cache, .. }) => assert_eq!(cache, "fresh"),
            other => panic!("expected resolved, got {:?}", other),
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_tiers_failing_surfaces_failure() {
        let transport = Arc::new(ScriptedTransport::failing(TransportError::status(403, "")));
        let resolver = resolver(transport.clone());

        let err = resolver
            .resolve(Store::Coles, &build_spec("milk_regular_cow"))
            .await
            .err();
        assert_eq!(err.map(|e| e.status), Some(403));
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_stops_the_walk() {
        let transport = Arc::new(ScriptedTransport::failing(TransportError::status(429, "")));
        let resolver = resolver(transport.clone());

        let err = resolver
            .resolve(Store::Coles, &build_spec("milk_regular_cow"))
            .await
            .err();
        assert!(err.map(|e| e.is_rate_limited()).unwrap_or(false));
        // one attempt plus the single extra attempt after the 429
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_upstream_stops_after_one_tier() {
        let transport = Arc::new(
            ScriptedTransport::always(page(&["Full Cream Milk 2L"]))
                .with_latency(Duration::from_secs(60)),
        );
        let resolver = resolver(transport.clone());

        let started = Instant::now();
        let err = resolver
            .resolve(Store::Coles, &build_spec("milk_regular_cow"))
            .await
            .err();
        assert_eq!(err.as_ref().map(|e| e.kind), Some(FailureKind::Timeout));
        assert_eq!(err.map(|e| e.status), Some(504));
        // one tier: three attempts, no further tiers
        assert_eq!(transport.calls(), 3);
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_upstream_stops_the_walk() {
        let transport = Arc::new(ScriptedTransport::failing(TransportError::Connect(
            "connection refused".to_string(),
        )));
        let resolver = resolver(transport.clone());

        let err = resolver
            .resolve(Store::Coles, &build_spec("milk_regular_cow"))
            .await
            .err();
        assert_eq!(err.map(|e| e.kind), Some(FailureKind::Network));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_errors_stop_the_walk() {
        let transport = Arc::new(ScriptedTransport::failing(TransportError::status(503, "")));
        let resolver = resolver(transport.clone());

        let err = resolver
            .resolve(Store::Coles, &build_spec("milk_regular_cow"))
            .await
            .err();
        assert_eq!(err.map(|e| e.status), Some(503));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_health_reports_cache_and_upstream() {
        let resolver = resolver(Arc::new(ScriptedTransport::always(SearchPage::default())));
        let checks = resolver.health();
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|c| c.status == HealthStatus::Healthy));
        assert_eq!(checks[1].component, "upstream");
    }

    #[test]
    fn test_resolution_serializes_with_outcome_tag() -> Result<(), serde_json::Error> {
        let resolution = Resolution::Unresolved {
            queries_tried: vec!["coles saffron".to_string()],
            candidates_seen: 0,
        };
        let json = serde_json::to_value(&resolution)?;
        assert_eq!(json["outcome"], "unresolved");
        assert_eq!(json["queriesTried"][0], "coles saffron");
        Ok(())
    }
}
