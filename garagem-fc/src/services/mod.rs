//! Service modules for the catalog pipeline

pub mod cache;
pub mod catalog;
pub mod filter_state;
pub mod fipe_client;
pub mod normalizer;
pub mod sync_orchestrator;

pub use cache::{CacheEntry, CatalogCache};
pub use catalog::CatalogService;
pub use filter_state::FilterEngine;
pub use fipe_client::{CatalogSource, FipeClient, FipeError};
pub use sync_orchestrator::{SyncMode, SyncOrchestrator, SyncReport};
