//! Ingredient resolution endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use pantry_core::{IngredientSpec, Store};
use pantry_match::build_spec;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::services::Resolution;
use crate::state::AppState;

/// Body of `POST /api/resolve`.
///
/// Either a full ingredient spec or a raw ingredient key; the key is
/// normalized into a spec when no spec is given.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub store: Store,
    #[serde(default)]
    pub ingredient: Option<IngredientSpec>,
    #[serde(default)]
    pub ingredient_key: Option<String>,
}

impl ResolveRequest {
    /// The spec to resolve.
    pub fn spec(&self) -> ApiResult<IngredientSpec> {
        if let Some(spec) = &self.ingredient {
            if spec.clean_name.trim().is_empty() {
                return Err(ApiError::missing_field("ingredient.cleanName"));
            }
            return Ok(spec.clone());
        }
        match self.ingredient_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                let spec = build_spec(key);
                if spec.clean_name.is_empty() {
                    return Err(ApiError::invalid_input(format!(
                        "Ingredient key '{}' has no searchable words",
                        key
                    )));
                }
                Ok(spec)
            }
            _ => Err(ApiError::missing_field("ingredient or ingredientKey")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ResolveResponse {
    pub store: Store,
    pub ingredient: IngredientSpec,
    pub resolution: Resolution,
}

/// POST /api/resolve - Resolve one ingredient to a product
#[utoipa::path(
    post,
    path = "/api/resolve",
    tag = "Resolve",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Resolved or unresolved outcome", body = ResolveResponse),
        (status = 400, description = "Missing or invalid ingredient", body = ErrorBody),
        (status = 429, description = "Upstream rate limited", body = ErrorBody),
        (status = 502, description = "Upstream failed on every query", body = ErrorBody),
    ),
)]
pub async fn resolve_ingredient(
    State(state): State<AppState>,
    body: Result<Json<ResolveRequest>, JsonRejection>,
) -> ApiResult<Json<ResolveResponse>> {
    let Json(request) = body.map_err(|e| ApiError::invalid_input(e.body_text()))?;
    let spec = request.spec()?;

    let resolution = state.resolver.resolve(request.store, &spec).await?;

    Ok(Json(ResolveResponse {
        store: request.store,
        ingredient: spec,
        resolution,
    }))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/", post(resolve_ingredient))
}
