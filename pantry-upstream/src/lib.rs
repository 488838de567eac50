//! PANTRY Upstream - rate-limited, retrying product search
//!
//! [`ResilientFetcher`] implements [`pantry_core::SourceFetcher`] over an
//! [`UpstreamTransport`]. The production transport is [`HttpTransport`].

pub mod fetcher;
pub mod rate_limit;
pub mod transport;

pub use fetcher::{backoff_delay, failure_from_transport, ResilientFetcher};
pub use rate_limit::{Admission, RateLimiter, TokenBucket};
pub use transport::{HttpTransport, TransportError, UpstreamTransport};
