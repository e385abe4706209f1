//! Settings database operations
//!
//! Key-value accessors over the settings table: the FIPE subscription
//! token and the durable last-sync timestamp.

use chrono::{DateTime, Utc};
use garagem_common::{Error, Result};
use sqlx::SqlitePool;

const FIPE_TOKEN_KEY: &str = "fipe_token";
const LAST_SYNC_AT_KEY: &str = "last_sync_at";

/// Get the FIPE subscription token from the database
pub async fn get_fipe_token(pool: &SqlitePool) -> Result<Option<String>> {
    get_setting::<String>(pool, FIPE_TOKEN_KEY).await
}

/// Set the FIPE subscription token in the database
pub async fn set_fipe_token(pool: &SqlitePool, token: String) -> Result<()> {
    set_setting(pool, FIPE_TOKEN_KEY, token).await
}

/// Read the durable last-sync timestamp
///
/// `None` means no sync has ever completed on this mirror.
pub async fn get_last_sync_at(pool: &SqlitePool) -> Result<Option<DateTime<Utc>>> {
    let raw = get_setting::<String>(pool, LAST_SYNC_AT_KEY).await?;
    match raw {
        Some(value) => {
            let parsed = DateTime::parse_from_rfc3339(&value)
                .map_err(|e| Error::Internal(format!("Invalid last_sync_at in database: {}", e)))?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        None => Ok(None),
    }
}

/// Persist the last-sync timestamp (RFC 3339)
pub async fn set_last_sync_at(pool: &SqlitePool, at: DateTime<Utc>) -> Result<()> {
    set_setting(pool, LAST_SYNC_AT_KEY, at.to_rfc3339()).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(pool: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(pool: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn test_fipe_token_roundtrip() {
        let pool = test_pool().await;

        assert_eq!(get_fipe_token(&pool).await.unwrap(), None);

        set_fipe_token(&pool, "tok_123".to_string()).await.unwrap();
        assert_eq!(get_fipe_token(&pool).await.unwrap(), Some("tok_123".to_string()));

        // Update replaces, never duplicates
        set_fipe_token(&pool, "tok_456".to_string()).await.unwrap();
        assert_eq!(get_fipe_token(&pool).await.unwrap(), Some("tok_456".to_string()));

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = 'fipe_token'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_last_sync_at_unset() {
        let pool = test_pool().await;
        assert_eq!(get_last_sync_at(&pool).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_last_sync_at_roundtrip() {
        let pool = test_pool().await;

        let stamped = Utc::now() - Duration::days(2);
        set_last_sync_at(&pool, stamped).await.unwrap();

        let loaded = get_last_sync_at(&pool).await.unwrap().unwrap();
        // RFC 3339 keeps sub-second precision; timestamps compare equal
        assert_eq!(loaded.timestamp_millis(), stamped.timestamp_millis());
    }

    #[tokio::test]
    async fn test_corrupt_last_sync_at_is_an_error() {
        let pool = test_pool().await;

        sqlx::query("INSERT INTO settings (key, value) VALUES ('last_sync_at', 'not-a-date')")
            .execute(&pool)
            .await
            .unwrap();

        assert!(get_last_sync_at(&pool).await.is_err());
    }
}
