//! PANTRY Core - data types, errors and configuration
//!
//! Everything here is plain data plus validation. Behavior lives in the
//! sibling crates:
//! - `pantry-match`: ingredient normalization and product scoring
//! - `pantry-upstream`: rate-limited retrying product search
//! - `pantry-storage`: guarded cache and stale-while-revalidate
//! - `pantry-api`: HTTP surface

pub mod circuit;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod health;
pub mod ingredient;
pub mod product;

pub use circuit::CircuitState;
pub use config::{CacheGuardConfig, FreshnessConfig, RateLimitConfig, ResolverConfig, UpstreamConfig};
pub use error::{
    CacheError, ConfigError, FailureKind, PantryError, PantryResult, UpstreamFailure,
    ValidationError,
};
pub use fetch::SourceFetcher;
pub use health::{overall_status, HealthCheck, HealthStatus};
pub use ingredient::{
    Dimension, IngredientSpec, MatchResult, Quantity, QuerySet, Rejection, SizeUnit, TargetSize,
};
pub use product::{parse_price_text, Product, SearchPage, SearchRequest, Store, StoreEndpoint};
