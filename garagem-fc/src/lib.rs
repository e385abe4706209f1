//! garagem-fc library interface
//!
//! FIPE catalog service: remote price catalog client, name normalization,
//! multi-tier caching, relational mirror sync, and the cascading filter
//! state machine. Exposed as a library so integration tests drive the
//! router directly.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

use crate::services::{
    CatalogCache, CatalogService, CatalogSource, FilterEngine, SyncOrchestrator, SyncReport,
};

/// Application state shared across handlers
///
/// Every service object is constructed explicitly and injected here;
/// nothing lives in module-level globals.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (catalog mirror + settings)
    pub db: SqlitePool,
    /// Read-through catalog access
    pub catalog: Arc<CatalogService>,
    /// Mirror synchronization
    pub sync: Arc<SyncOrchestrator>,
    /// Filter option computation
    pub filters: Arc<FilterEngine>,
    /// Held for the duration of a sync run; try_lock failure means a run
    /// is active
    pub sync_lock: Arc<Mutex<()>>,
    /// Report of the most recent sync run
    pub last_sync_report: Arc<RwLock<Option<SyncReport>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        source: Arc<dyn CatalogSource>,
        cache: Arc<CatalogCache>,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&source),
            Arc::clone(&cache),
            db.clone(),
        ));
        let sync = Arc::new(SyncOrchestrator::new(source, cache, db.clone()));
        let filters = Arc::new(FilterEngine::new(Arc::clone(&catalog)));

        Self {
            db,
            catalog,
            sync,
            filters,
            sync_lock: Arc::new(Mutex::new(())),
            last_sync_report: Arc::new(RwLock::new(None)),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::catalog_routes())
        .merge(api::filter_routes())
        .merge(api::sync_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
