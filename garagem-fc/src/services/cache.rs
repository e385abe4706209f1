//! Multi-tier catalog cache
//!
//! Read-through over two local tiers: an in-process memory map and a
//! persisted JSON file tier under the service root folder. The relational
//! mirror is the third conceptual tier, consulted by the catalog service
//! rather than by the cache itself. Persisted-tier failures are logged and
//! degrade to memory-only; they never reach the caller.

use garagem_common::time;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Key prefix for persisted cache files
pub const CACHE_KEY_PREFIX: &str = "fipe_cache_";

/// Sweep interval for the expired-entry cleaner
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// TTL policy by data class: brand lists change least often, yearly trims
/// roll over most often.
pub mod ttl {
    use std::time::Duration;

    pub const BRANDS: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    pub const MODELS: Duration = Duration::from_secs(3 * 24 * 60 * 60);
    pub const YEARS: Duration = Duration::from_secs(24 * 60 * 60);
    pub const DEFAULT: Duration = Duration::from_secs(24 * 60 * 60);
}

/// One cached payload with its lifetime bookkeeping (epoch millis)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    pub timestamp: i64,
    pub expires_at: i64,
}

impl CacheEntry {
    fn fresh(data: Value, ttl: Duration) -> Self {
        let now = time::epoch_millis();
        Self {
            data,
            timestamp: now,
            expires_at: now + ttl.as_millis() as i64,
        }
    }

    /// Entries are valid strictly before `expires_at`
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        now_millis >= self.expires_at
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(time::epoch_millis())
    }
}

/// Two-tier read-through/write-through cache
pub struct CatalogCache {
    memory: RwLock<HashMap<String, CacheEntry>>,
    disk_dir: Option<PathBuf>,
}

impl CatalogCache {
    /// Create a cache with an optional persisted tier
    ///
    /// When the persisted directory cannot be created the cache silently
    /// runs memory-only.
    pub fn new(disk_dir: Option<PathBuf>) -> Self {
        let disk_dir = disk_dir.and_then(|dir| match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(dir),
            Err(e) => {
                tracing::warn!(
                    dir = %dir.display(),
                    "Persisted cache tier unavailable, running memory-only: {}",
                    e
                );
                None
            }
        });

        Self {
            memory: RwLock::new(HashMap::new()),
            disk_dir,
        }
    }

    /// Memory-only cache (tests, degraded mode)
    pub fn memory_only() -> Self {
        Self::new(None)
    }

    /// Write an entry to both tiers
    ///
    /// The persisted write is best-effort; failures are logged and the
    /// memory tier still serves the entry.
    pub async fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, "Cache encode failed, entry dropped: {}", e);
                return;
            }
        };
        let entry = CacheEntry::fresh(value, ttl);

        if let Some(dir) = &self.disk_dir {
            if let Err(e) = write_disk_entry(dir, key, &entry) {
                tracing::warn!(key, "Persisted cache write failed: {}", e);
            }
        }

        self.memory.write().await.insert(key.to_string(), entry);
    }

    /// Read an entry, promoting persisted hits back into memory
    ///
    /// Expired entries are treated as absent and evicted lazily from the
    /// tier they were found in.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        // Tier 1: memory
        {
            let memory = self.memory.read().await;
            if let Some(entry) = memory.get(key) {
                if !entry.is_expired() {
                    return decode(key, entry.data.clone());
                }
            }
        }
        // Expired memory entries are dropped before falling through
        {
            let mut memory = self.memory.write().await;
            if memory.get(key).map(CacheEntry::is_expired).unwrap_or(false) {
                memory.remove(key);
            }
        }

        // Tier 2: persisted store
        let dir = self.disk_dir.as_ref()?;
        let entry = read_disk_entry(dir, key)?;
        if entry.is_expired() {
            remove_disk_entry(dir, key);
            return None;
        }

        // Promote back into memory
        self.memory
            .write()
            .await
            .insert(key.to_string(), entry.clone());
        decode(key, entry.data)
    }

    /// Remove one key from both tiers
    pub async fn remove(&self, key: &str) {
        self.memory.write().await.remove(key);
        if let Some(dir) = &self.disk_dir {
            remove_disk_entry(dir, key);
        }
    }

    /// Drop everything from both tiers
    pub async fn clear(&self) {
        self.memory.write().await.clear();
        if let Some(dir) = &self.disk_dir {
            for path in list_disk_entries(dir) {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), "Cache file removal failed: {}", e);
                }
            }
        }
    }

    /// Sweep expired entries from both tiers
    pub async fn clean_expired(&self) {
        let now = time::epoch_millis();

        let mut memory = self.memory.write().await;
        let before = memory.len();
        memory.retain(|_, entry| !entry.is_expired_at(now));
        let swept_memory = before - memory.len();
        drop(memory);

        let mut swept_disk = 0usize;
        if let Some(dir) = &self.disk_dir {
            for path in list_disk_entries(dir) {
                let expired = std::fs::read_to_string(&path)
                    .ok()
                    .and_then(|content| serde_json::from_str::<CacheEntry>(&content).ok())
                    .map(|entry| entry.is_expired_at(now))
                    // Unreadable files count as garbage
                    .unwrap_or(true);
                if expired {
                    if std::fs::remove_file(&path).is_ok() {
                        swept_disk += 1;
                    }
                }
            }
        }

        if swept_memory > 0 || swept_disk > 0 {
            tracing::debug!(swept_memory, swept_disk, "Cache sweep removed expired entries");
        }
    }

    /// Spawn the periodic sweeper task
    ///
    /// The first tick fires immediately, covering the sweep-on-startup
    /// requirement; subsequent ticks run hourly.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                cache.clean_expired().await;
            }
        })
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::warn!(key, "Cache decode failed, treating as miss: {}", e);
            None
        }
    }
}

/// File name for a key: prefix plus the key with non-alphanumerics folded
fn disk_path(dir: &Path, key: &str) -> PathBuf {
    let sanitized: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    dir.join(format!("{}{}.json", CACHE_KEY_PREFIX, sanitized))
}

fn write_disk_entry(dir: &Path, key: &str, entry: &CacheEntry) -> std::io::Result<()> {
    let content = serde_json::to_string(entry)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(disk_path(dir, key), content)
}

fn read_disk_entry(dir: &Path, key: &str) -> Option<CacheEntry> {
    let content = std::fs::read_to_string(disk_path(dir, key)).ok()?;
    match serde_json::from_str(&content) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!(key, "Corrupt persisted cache entry, dropping: {}", e);
            remove_disk_entry(dir, key);
            None
        }
    }
}

fn remove_disk_entry(dir: &Path, key: &str) {
    let path = disk_path(dir, key);
    if path.exists() {
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), "Cache file removal failed: {}", e);
        }
    }
}

fn list_disk_entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(CACHE_KEY_PREFIX) && name.ends_with(".json"))
                .unwrap_or(false)
        })
        .collect()
}
