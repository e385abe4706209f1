//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logging section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter ("trace", "debug", "info", "warn", "error")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// TOML configuration file contents
///
/// All fields are optional; anything absent falls back to the environment
/// or the compiled default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Service data directory (database, cache files)
    pub root_folder: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Base URL of the remote price catalog API
    pub fipe_base_url: Option<String>,
    /// Subscription token for elevated catalog rate limits
    pub fipe_token: Option<String>,
    /// HTTP listen port
    pub port: Option<u16>,
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root_folder) = load_toml_config().root_folder {
        return PathBuf::from(root_folder);
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get configuration file path for the platform
///
/// Linux checks `~/.config/garagem/config.toml` then `/etc/garagem/config.toml`;
/// macOS and Windows use the platform config directory.
pub fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        if let Some(path) = dirs::config_dir().map(|d| d.join("garagem").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/garagem/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("garagem").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Load the TOML config file, falling back to defaults on any failure
///
/// Missing or malformed config is not fatal; the service runs on defaults.
pub fn load_toml_config() -> TomlConfig {
    let path = match config_file_path() {
        Ok(path) => path,
        Err(_) => return TomlConfig::default(),
    };
    read_toml_config(&path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config file {}: {}", path.display(), e);
        TomlConfig::default()
    })
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write a TOML config file (write-to-temp then rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Encode TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/garagem (or /var/lib/garagem for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("garagem"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/garagem"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/garagem
        dirs::data_dir()
            .map(|d| d.join("garagem"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/garagem"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\garagem
        dirs::data_local_dir()
            .map(|d| d.join("garagem"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\garagem"))
    } else {
        PathBuf::from("./garagem_data")
    }
}

/// Create the root folder (and parents) if missing
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    Ok(())
}

/// Database file path inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("garagem.db")
}

/// Persisted cache tier directory inside the root folder
pub fn cache_dir(root: &Path) -> PathBuf {
    root.join("cache")
}
