//! Mirror synchronization endpoints
//!
//! Manual sync triggers plus a status view. Only one sync runs at a time;
//! a trigger while a run is active returns 409 CONFLICT.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::services::SyncReport;
use crate::AppState;

/// Sync status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub running: bool,
    pub needs_sync: bool,
    pub last_report: Option<SyncReport>,
}

/// POST /api/sync/full
pub async fn trigger_full_sync(State(state): State<AppState>) -> ApiResult<Json<SyncReport>> {
    let _run = state
        .sync_lock
        .try_lock()
        .map_err(|_| ApiError::Conflict("A sync is already running".to_string()))?;

    let report = state.sync.full_sync().await?;
    *state.last_sync_report.write().await = Some(report.clone());

    Ok(Json(report))
}

/// POST /api/sync/incremental
pub async fn trigger_incremental_sync(
    State(state): State<AppState>,
) -> ApiResult<Json<SyncReport>> {
    let _run = state
        .sync_lock
        .try_lock()
        .map_err(|_| ApiError::Conflict("A sync is already running".to_string()))?;

    let report = state.sync.incremental_sync().await?;
    *state.last_sync_report.write().await = Some(report.clone());

    Ok(Json(report))
}

/// GET /api/sync/status
pub async fn sync_status(State(state): State<AppState>) -> ApiResult<Json<SyncStatusResponse>> {
    let running = state.sync_lock.try_lock().is_err();
    let needs_sync = state.sync.needs_sync().await?;
    let last_report = state.last_sync_report.read().await.clone();

    Ok(Json(SyncStatusResponse {
        running,
        needs_sync,
        last_report,
    }))
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sync/full", post(trigger_full_sync))
        .route("/api/sync/incremental", post(trigger_incremental_sync))
        .route("/api/sync/status", get(sync_status))
}
