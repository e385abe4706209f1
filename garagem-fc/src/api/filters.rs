//! Filter state endpoints
//!
//! Drives the cascading brand/model/year/version dropdowns: option
//! recomputation and selection updates with downstream resets.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::models::{FilterField, FilterOptions, FilterState};
use crate::services::FilterEngine;
use crate::AppState;

/// Response to an option recomputation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionsResponse {
    pub options: FilterOptions,
    pub selection_complete: bool,
}

/// Body of a selection update
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFilterRequest {
    pub field: FilterField,
    pub value: Option<String>,
    #[serde(default)]
    pub state: FilterState,
}

/// POST /api/filters/options
///
/// Option lists are best-effort: a failed stage yields the partial result
/// with empty lists for unreached stages, never an error.
pub async fn filter_options(
    State(state): State<AppState>,
    Json(filter_state): Json<FilterState>,
) -> Json<FilterOptionsResponse> {
    let options = state.filters.filter_options(&filter_state).await;

    Json(FilterOptionsResponse {
        options,
        selection_complete: FilterEngine::is_selection_complete(&filter_state),
    })
}

/// POST /api/filters/update
///
/// Applies one selection change and returns the cascaded state.
pub async fn update_filter(Json(request): Json<UpdateFilterRequest>) -> Json<FilterState> {
    let next = FilterEngine::update_filter(
        request.field,
        request.value.as_deref(),
        &request.state,
    );
    Json(next)
}

/// Build filter routes
pub fn filter_routes() -> Router<AppState> {
    Router::new()
        .route("/api/filters/options", post(filter_options))
        .route("/api/filters/update", post(update_filter))
}
