//! garagem-fc - FIPE Catalog Service
//!
//! Keeps the vehicle price catalog available to the marketplace: remote
//! catalog reads with multi-tier caching, a relational mirror kept fresh
//! by the sync orchestrator, and the filter state machine behind the
//! listing-creation dropdowns.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use garagem_fc::services::{CatalogCache, FipeClient};
use garagem_fc::AppState;

const DEFAULT_PORT: u16 = 6230;
const ROOT_FOLDER_ENV: &str = "GARAGEM_ROOT_FOLDER";

#[derive(Debug, Parser)]
#[command(name = "garagem-fc", about = "FIPE catalog service")]
struct Args {
    /// Service data directory (database, cache files)
    #[arg(long)]
    root_folder: Option<String>,

    /// HTTP listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = garagem_common::config::load_toml_config();

    // Initialize tracing; RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(toml_config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting garagem-fc (FIPE catalog service)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve and prepare the root folder
    let root_folder =
        garagem_common::config::resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV);
    garagem_common::config::ensure_root_folder(&root_folder)
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;
    info!("Root folder: {}", root_folder.display());

    // Open or create the database
    let db_path = garagem_common::config::database_path(&root_folder);
    info!("Database: {}", db_path.display());
    let db_pool = garagem_fc::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Resolve the subscription token (Database → ENV → TOML)
    let token = garagem_fc::config::resolve_fipe_token(&db_pool, &toml_config).await?;

    // Catalog client, optionally against a config-overridden base URL
    let client = match &toml_config.fipe_base_url {
        Some(base_url) => FipeClient::with_base_url(base_url.clone(), token),
        None => FipeClient::new(token),
    }
    .map_err(|e| anyhow::anyhow!("Failed to create catalog client: {}", e))?;

    // Cache with a persisted tier under the root folder; the sweeper's
    // first tick covers the sweep-on-startup requirement
    let cache = Arc::new(CatalogCache::new(Some(
        garagem_common::config::cache_dir(&root_folder),
    )));
    let _sweeper = cache.spawn_sweeper();

    let state = AppState::new(db_pool, Arc::new(client), cache);

    // Startup hook: bring the mirror up to date in the background
    {
        let sync = Arc::clone(&state.sync);
        let sync_lock = Arc::clone(&state.sync_lock);
        tokio::spawn(async move {
            let _run = sync_lock.lock().await;
            sync.auto_sync().await;
        });
    }

    let app = garagem_fc::build_router(state);

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
