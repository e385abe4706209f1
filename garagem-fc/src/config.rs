//! Configuration resolution for the catalog service
//!
//! The FIPE subscription token is optional (the public catalog tier works
//! without one) and resolves with Database → ENV → TOML priority.

use crate::db;
use garagem_common::config::TomlConfig;
use garagem_common::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Environment variable carrying the subscription token
pub const FIPE_TOKEN_ENV: &str = "GARAGEM_FIPE_TOKEN";

/// Resolve the FIPE subscription token from 3-tier configuration
///
/// Priority: Database → ENV → TOML. Returns `None` when no tier carries a
/// valid token; the client then runs against public rate limits.
pub async fn resolve_fipe_token(
    pool: &SqlitePool,
    toml_config: &TomlConfig,
) -> Result<Option<String>> {
    let mut sources = Vec::new();

    // Tier 1: Database (authoritative)
    let db_token = db::settings::get_fipe_token(pool).await?;
    if db_token.as_deref().map(is_valid_token).unwrap_or(false) {
        sources.push("database");
    }

    // Tier 2: Environment variable
    let env_token = std::env::var(FIPE_TOKEN_ENV).ok();
    if env_token.as_deref().map(is_valid_token).unwrap_or(false) {
        sources.push("environment");
    }

    // Tier 3: TOML config
    let toml_token = toml_config.fipe_token.clone();
    if toml_token.as_deref().map(is_valid_token).unwrap_or(false) {
        sources.push("TOML");
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "FIPE token found in multiple sources: {}. Using database (highest priority).",
            sources.join(", ")
        );
    }

    // Resolution priority
    if let Some(token) = db_token.filter(|token| is_valid_token(token)) {
        info!("FIPE token loaded from database");
        return Ok(Some(token));
    }

    if let Some(token) = env_token.filter(|token| is_valid_token(token)) {
        info!("FIPE token loaded from environment variable");
        return Ok(Some(token));
    }

    if let Some(token) = toml_token.filter(|token| is_valid_token(token)) {
        info!("FIPE token loaded from TOML config");
        return Ok(Some(token));
    }

    info!("No FIPE token configured; using public catalog rate limits");
    Ok(None)
}

/// Validate a token (non-empty, non-whitespace)
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}

/// Sync settings from database to the TOML file
///
/// The TOML write is best-effort: the database write already succeeded,
/// so a failed backup only logs.
pub async fn sync_settings_to_toml(
    settings: HashMap<String, String>,
    toml_path: &Path,
) -> Result<()> {
    let mut config = if toml_path.exists() {
        garagem_common::config::read_toml_config(toml_path)?
    } else {
        TomlConfig::default()
    };

    if let Some(token) = settings.get("fipe_token") {
        config.fipe_token = Some(token.clone());
    }

    match garagem_common::config::write_toml_config(&config, toml_path) {
        Ok(()) => {
            info!("Settings synced to TOML: {}", toml_path.display());
            Ok(())
        }
        Err(e) => {
            warn!("TOML write failed (database write succeeded): {}", e);
            Ok(())
        }
    }
}
