//! Catalog browsing endpoints
//!
//! Read-through views over the remote catalog: raw brand/model/year lists
//! plus the price detail for a fully-qualified selection.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::ApiResult;
use crate::models::{CatalogItem, PriceDetail, ProcessedModel};
use crate::AppState;

/// GET /api/catalog/brands
pub async fn list_brands(State(state): State<AppState>) -> ApiResult<Json<Vec<CatalogItem>>> {
    let brands = state.catalog.get_brands().await?;
    Ok(Json(brands))
}

/// GET /api/catalog/brands/:brand/models
///
/// Models grouped by clean name; the raw manufacturer string stays
/// available in `fullName`.
pub async fn list_models(
    State(state): State<AppState>,
    Path(brand_code): Path<String>,
) -> ApiResult<Json<Vec<ProcessedModel>>> {
    let models = state.catalog.get_processed_models(&brand_code).await?;
    Ok(Json(models))
}

/// GET /api/catalog/brands/:brand/models/:model/years
pub async fn list_years(
    State(state): State<AppState>,
    Path((brand_code, model_code)): Path<(String, String)>,
) -> ApiResult<Json<Vec<CatalogItem>>> {
    let years = state.catalog.get_years(&brand_code, &model_code).await?;
    Ok(Json(years))
}

/// GET /api/catalog/brands/:brand/models/:model/years/:year
///
/// Price detail; successful lookups are mirrored into the price table.
pub async fn price_detail(
    State(state): State<AppState>,
    Path((brand_code, model_code, year_code)): Path<(String, String, String)>,
) -> ApiResult<Json<PriceDetail>> {
    let detail = state
        .catalog
        .get_price(&brand_code, &model_code, &year_code)
        .await?;
    Ok(Json(detail))
}

/// Build catalog browsing routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/catalog/brands", get(list_brands))
        .route("/api/catalog/brands/:brand/models", get(list_models))
        .route(
            "/api/catalog/brands/:brand/models/:model/years",
            get(list_years),
        )
        .route(
            "/api/catalog/brands/:brand/models/:model/years/:year",
            get(price_detail),
        )
}
