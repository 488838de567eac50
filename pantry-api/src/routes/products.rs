//! Product search endpoint.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderName, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use pantry_core::{SearchPage, Store};

use crate::constants::CACHE_STATUS_HEADER;
use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::state::AppState;

/// Query parameters for `GET /api/products`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// `woolworths` or `coles`
    pub store: Option<String>,
    pub query: Option<String>,
    /// 1-based page number (default 1)
    pub page: Option<u32>,
}

/// GET /api/products - Search one store, cache first
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(SearchParams),
    responses(
        (status = 200, description = "Search results; x-cache reports fresh, stale, expired or miss", body = SearchPage),
        (status = 400, description = "Invalid store, query or page", body = ErrorBody),
        (status = 429, description = "Upstream rate limited", body = ErrorBody),
        (status = 502, description = "Upstream failed", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody),
    ),
)]
pub async fn search_products(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params.map_err(|e| ApiError::invalid_input(e.body_text()))?;

    let store: Store = params
        .store
        .as_deref()
        .ok_or_else(|| ApiError::missing_field("store"))?
        .parse()?;
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::missing_field("query"))?;
    let page = params.page.unwrap_or(1);

    let lookup = state.resolver.search(store, query, page).await?;

    let header = (
        HeaderName::from_static(CACHE_STATUS_HEADER),
        HeaderValue::from_static(lookup.source.as_str()),
    );
    Ok(([header], Json(lookup.value)))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/", get(search_products))
}
