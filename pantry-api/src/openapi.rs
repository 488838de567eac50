//! OpenAPI Specification for PANTRY API
//!
//! Generated with utoipa from the route annotations and schema derives.

use axum::Json;
use utoipa::OpenApi;

use pantry_core::{
    FailureKind, HealthCheck, HealthStatus, IngredientSpec, MatchResult, Product, QuerySet,
    Rejection, SearchPage, SizeUnit, Store, TargetSize, UpstreamFailure,
};

use crate::error::{ErrorBody, ErrorCode};
use crate::routes::{health, products, resolve};
use crate::services::Resolution;
use crate::telemetry::metrics;

/// OpenAPI document for the PANTRY API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PANTRY API",
        description = "Resolve ingredient references into priced grocery products",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Products", description = "Cached store product search"),
        (name = "Resolve", description = "Ingredient to product resolution"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        products::search_products,
        resolve::resolve_ingredient,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(schemas(
        Store,
        Product,
        SearchPage,
        IngredientSpec,
        TargetSize,
        SizeUnit,
        QuerySet,
        MatchResult,
        Rejection,
        FailureKind,
        UpstreamFailure,
        HealthCheck,
        HealthStatus,
        Resolution,
        resolve::ResolveRequest,
        resolve::ResolveResponse,
        health::HealthResponse,
        health::HealthDetails,
        ErrorBody,
        ErrorCode,
    ))
)]
pub struct ApiDoc;

/// GET /openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
