//! Resilient product-search fetcher
//!
//! Flow for one request:
//! 1. acquire from the store's token bucket (advisory)
//! 2. up to `max_attempts` attempts, each bounded by `attempt_timeout`,
//!    with exponential backoff between retryable failures
//! 3. a 429 ends the loop at once; after `rate_limit_delay` exactly one
//!    extra attempt is made outside the normal budget
//!
//! Every failure leaves as an [`UpstreamFailure`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::{debug, info_span, warn, Instrument};

use pantry_core::{
    FailureKind, PantryResult, RateLimitConfig, ResolverConfig, SearchPage, SearchRequest,
    SourceFetcher, UpstreamConfig, UpstreamFailure,
};

use crate::rate_limit::{Admission, RateLimiter};
use crate::transport::{HttpTransport, TransportError, UpstreamTransport};

/// Result of the bounded attempt loop.
enum AttemptOutcome {
    Success { page: SearchPage, attempts: u32 },
    RateLimited { attempts: u32 },
    Failed(UpstreamFailure),
}

/// Map a transport error to the normalized failure shape.
pub fn failure_from_transport(err: TransportError, attempts: u32) -> UpstreamFailure {
    match err {
        TransportError::Status { status, body } => {
            let message = if body.trim().is_empty() {
                format!("Upstream returned status {}", status)
            } else {
                format!("Upstream returned status {}: {}", status, body)
            };
            UpstreamFailure::from_status(status, message, attempts)
        }
        TransportError::Timeout => {
            UpstreamFailure::new(FailureKind::Timeout, "Upstream request timed out", attempts)
        }
        TransportError::Connect(reason) => UpstreamFailure::new(
            FailureKind::Network,
            format!("Upstream unreachable: {}", reason),
            attempts,
        ),
        TransportError::Decode(reason) => UpstreamFailure::new(
            FailureKind::InvalidResponse,
            format!("Upstream response invalid: {}", reason),
            attempts,
        ),
    }
}

/// Backoff before retrying after `attempt`: base, then doubling.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
}

/// Rate-limited retrying fetcher over any [`UpstreamTransport`].
pub struct ResilientFetcher {
    transport: Arc<dyn UpstreamTransport>,
    limiter: Arc<RateLimiter>,
    config: UpstreamConfig,
}

impl ResilientFetcher {
    pub fn new(
        transport: Arc<dyn UpstreamTransport>,
        limiter: Arc<RateLimiter>,
        config: UpstreamConfig,
    ) -> Self {
        Self {
            transport,
            limiter,
            config,
        }
    }

    /// Fetcher over the HTTP transport with a fresh rate limiter.
    pub fn from_config(config: &ResolverConfig) -> PantryResult<Self> {
        let transport = HttpTransport::new(&config.upstream)?;
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(RateLimiter::new(config.rate_limit.clone())),
            config.upstream.clone(),
        ))
    }

    /// Fetcher with a custom transport and default limits.
    pub fn with_transport(transport: Arc<dyn UpstreamTransport>) -> Self {
        Self::new(
            transport,
            Arc::new(RateLimiter::new(RateLimitConfig::default())),
            UpstreamConfig::default(),
        )
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    async fn attempt(&self, request: &SearchRequest) -> Result<SearchPage, TransportError> {
        match timeout(self.config.attempt_timeout, self.transport.search(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    async fn run_attempts(&self, request: &SearchRequest) -> AttemptOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = TransportError::Timeout;

        for attempt in 1..=max_attempts {
            match self.attempt(request).await {
                Ok(page) => {
                    return AttemptOutcome::Success {
                        page,
                        attempts: attempt,
                    }
                }
                Err(err) if err.is_rate_limited() => {
                    warn!(store = %request.store, attempt, "Upstream rate limited, leaving retry loop");
                    return AttemptOutcome::RateLimited { attempts: attempt };
                }
                Err(err) if err.is_retryable() => {
                    if attempt < max_attempts {
                        let delay = backoff_delay(self.config.backoff_base, attempt);
                        warn!(
                            store = %request.store,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Upstream attempt failed, retrying"
                        );
                        sleep(delay).await;
                    }
                    last_error = err;
                }
                Err(err) => {
                    return AttemptOutcome::Failed(failure_from_transport(err, attempt));
                }
            }
        }

        AttemptOutcome::Failed(failure_from_transport(last_error, max_attempts))
    }

    async fn fetch_page(&self, request: &SearchRequest) -> Result<SearchPage, UpstreamFailure> {
        let admission = self.limiter.acquire(request.store).await;
        if admission != Admission::Granted {
            debug!(store = %request.store, admission = admission.as_str(), "Rate limiter admission");
        }

        match self.run_attempts(request).await {
            AttemptOutcome::Success { page, attempts } => {
                debug!(results = page.results.len(), attempts, "Upstream search succeeded");
                Ok(page)
            }
            AttemptOutcome::Failed(failure) => {
                warn!(status = failure.status, attempts = failure.attempts, "Upstream search failed");
                Err(failure)
            }
            AttemptOutcome::RateLimited { attempts } => {
                sleep(self.config.rate_limit_delay).await;
                let attempts = attempts + 1;
                self.attempt(request).await.map_err(|err| {
                    let failure = failure_from_transport(err, attempts);
                    warn!(status = failure.status, attempts, "Extra attempt after 429 failed");
                    failure
                })
            }
        }
    }
}

#[async_trait]
impl SourceFetcher for ResilientFetcher {
    type Value = SearchPage;

    async fn fetch(&self, request: &SearchRequest) -> Result<SearchPage, UpstreamFailure> {
        let span = info_span!(
            "upstream_fetch",
            store = %request.store,
            query = %request.query,
            page = request.page
        );
        self.fetch_page(request).instrument(span).await
    }
}

impl std::fmt::Debug for ResilientFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientFetcher")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::{Product, Store};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays queued results; an exhausted queue hangs forever.
    struct MockTransport {
        script: Mutex<VecDeque<Result<SearchPage, TransportError>>>,
        calls: AtomicU32,
    }

    impl MockTransport {
        fn new(script: Vec<Result<SearchPage, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UpstreamTransport for MockTransport {
        async fn search(&self, _request: &SearchRequest) -> Result<SearchPage, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
            match next {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }
    }

    fn page() -> SearchPage {
        SearchPage::from_products(vec![Product::named("Garlic Bulb 3 Pack")])
    }

    fn request() -> SearchRequest {
        match SearchRequest::new(Store::Coles, "coles garlic", 1, 20) {
            Ok(r) => r,
            Err(e) => panic!("valid request: {}", e),
        }
    }

    fn fetcher(transport: Arc<MockTransport>) -> ResilientFetcher {
        ResilientFetcher::with_transport(transport)
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_millis(1500);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(1500));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(3000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_attempt() {
        let transport = MockTransport::new(vec![Ok(page())]);
        let result = fetcher(transport.clone()).fetch(&request()).await;
        assert_eq!(result, Ok(page()));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_error_retried_with_backoff() {
        let transport = MockTransport::new(vec![
            Err(TransportError::status(502, "bad gateway")),
            Err(TransportError::Connect("dns failure".to_string())),
            Ok(page()),
        ]);
        let start = Instant::now();
        let result = fetcher(transport.clone()).fetch(&request()).await;
        assert_eq!(result, Ok(page()));
        assert_eq!(transport.calls(), 3);
        assert!(start.elapsed() >= Duration::from_millis(1500 + 3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_returns_structured_failure() {
        let transport = MockTransport::new(vec![
            Err(TransportError::status(503, "")),
            Err(TransportError::status(503, "")),
            Err(TransportError::status(503, "")),
            Ok(page()),
        ]);
        let failure = fetcher(transport.clone()).fetch(&request()).await.err();
        assert_eq!(transport.calls(), 3);
        let failure = failure.unwrap_or_else(|| panic!("expected failure"));
        assert_eq!(failure.status, 503);
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.kind, FailureKind::Status);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_status_is_terminal() {
        let transport = MockTransport::new(vec![Err(TransportError::status(404, "nope")), Ok(page())]);
        let failure = fetcher(transport.clone()).fetch(&request()).await.err();
        assert_eq!(transport.calls(), 1);
        assert_eq!(failure.map(|f| (f.status, f.attempts)), Some((404, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_times_out() {
        let transport = MockTransport::new(vec![]);
        let start = Instant::now();
        let failure = fetcher(transport.clone()).fetch(&request()).await.err();
        assert_eq!(transport.calls(), 3);
        let failure = failure.unwrap_or_else(|| panic!("expected timeout"));
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(failure.status, 504);
        // three 6s attempts plus 1.5s and 3s of backoff
        assert!(start.elapsed() >= Duration::from_millis(3 * 6000 + 1500 + 3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_triggers_exactly_one_extra_attempt() {
        let transport = MockTransport::new(vec![
            Err(TransportError::status(429, "slow down")),
            Err(TransportError::status(429, "slow down")),
            Ok(page()),
        ]);
        let start = Instant::now();
        let failure = fetcher(transport.clone()).fetch(&request()).await.err();
        assert_eq!(transport.calls(), 2);
        assert!(start.elapsed() >= Duration::from_millis(700));
        let failure = failure.unwrap_or_else(|| panic!("expected 429"));
        assert!(failure.is_rate_limited());
        assert_eq!(failure.status, 429);
        assert_eq!(failure.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_extra_attempt_can_succeed() {
        let transport = MockTransport::new(vec![
            Err(TransportError::status(503, "")),
            Err(TransportError::status(429, "")),
            Ok(page()),
        ]);
        let result = fetcher(transport.clone()).fetch(&request()).await;
        assert_eq!(result, Ok(page()));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_error_is_terminal() {
        let transport = MockTransport::new(vec![Err(TransportError::Decode("eof".to_string()))]);
        let failure = fetcher(transport.clone()).fetch(&request()).await.err();
        assert_eq!(transport.calls(), 1);
        assert_eq!(failure.map(|f| f.kind), Some(FailureKind::InvalidResponse));
    }
}
