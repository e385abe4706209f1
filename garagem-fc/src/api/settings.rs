//! Settings endpoints
//!
//! The FIPE subscription token is managed at runtime: the database is the
//! authoritative store, with a best-effort TOML backup write.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Token presence view; the token itself is never echoed back
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatusResponse {
    pub configured: bool,
}

/// Body of a token update
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTokenRequest {
    pub token: String,
}

/// GET /api/settings/fipe-token
pub async fn token_status(State(state): State<AppState>) -> ApiResult<Json<TokenStatusResponse>> {
    let token = db::settings::get_fipe_token(&state.db).await?;
    Ok(Json(TokenStatusResponse {
        configured: token.as_deref().map(config::is_valid_token).unwrap_or(false),
    }))
}

/// PUT /api/settings/fipe-token
///
/// Persists to the database and mirrors to the TOML config as a backup.
/// The new token is picked up on the next service start.
pub async fn set_token(
    State(state): State<AppState>,
    Json(request): Json<SetTokenRequest>,
) -> ApiResult<Json<TokenStatusResponse>> {
    if !config::is_valid_token(&request.token) {
        return Err(ApiError::BadRequest("Token must not be blank".to_string()));
    }

    db::settings::set_fipe_token(&state.db, request.token.clone()).await?;

    if let Ok(toml_path) = garagem_common::config::config_file_path() {
        let mut settings = HashMap::new();
        settings.insert("fipe_token".to_string(), request.token);
        config::sync_settings_to_toml(settings, &toml_path).await?;
    }

    Ok(Json(TokenStatusResponse { configured: true }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/api/settings/fipe-token",
        get(token_status).put(set_token),
    )
}
