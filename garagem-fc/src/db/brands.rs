//! Brand mirror table operations

use garagem_common::Result;
use sqlx::SqlitePool;

/// Mirrored catalog brand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandRecord {
    pub code: String,
    pub name: String,
    pub active: bool,
}

impl BrandRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            active: true,
        }
    }
}

/// Upsert a brand (idempotent on `code`)
pub async fn upsert_brand(pool: &SqlitePool, brand: &BrandRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO catalog_brands (code, name, active, created_at, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(code) DO UPDATE SET
            name = excluded.name,
            active = excluded.active,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&brand.code)
    .bind(&brand.name)
    .bind(brand.active)
    .execute(pool)
    .await?;

    Ok(())
}

/// All mirrored brands, ordered by name
pub async fn list_brands(pool: &SqlitePool) -> Result<Vec<BrandRecord>> {
    let rows: Vec<(String, String, bool)> = sqlx::query_as(
        "SELECT code, name, active FROM catalog_brands ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(code, name, active)| BrandRecord { code, name, active })
        .collect())
}

/// Codes of all mirrored brands
pub async fn list_brand_codes(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT code FROM catalog_brands")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(code,)| code).collect())
}

/// Number of mirrored brands
pub async fn count_brands(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_brands")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_upsert_and_list_brands() {
        let pool = test_pool().await;

        upsert_brand(&pool, &BrandRecord::new("21", "Fiat")).await.unwrap();
        upsert_brand(&pool, &BrandRecord::new("25", "Honda")).await.unwrap();

        let brands = list_brands(&pool).await.unwrap();
        assert_eq!(brands.len(), 2);
        assert_eq!(brands[0].name, "Fiat");
        assert_eq!(brands[1].name, "Honda");
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let pool = test_pool().await;

        upsert_brand(&pool, &BrandRecord::new("21", "Fiat")).await.unwrap();
        upsert_brand(&pool, &BrandRecord::new("21", "Fiat")).await.unwrap();

        assert_eq!(count_brands(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_updates_name() {
        let pool = test_pool().await;

        upsert_brand(&pool, &BrandRecord::new("21", "Fiatt")).await.unwrap();
        upsert_brand(&pool, &BrandRecord::new("21", "Fiat")).await.unwrap();

        let brands = list_brands(&pool).await.unwrap();
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].name, "Fiat");
    }

    #[tokio::test]
    async fn test_list_brand_codes_empty_mirror() {
        let pool = test_pool().await;
        assert!(list_brand_codes(&pool).await.unwrap().is_empty());
        assert_eq!(count_brands(&pool).await.unwrap(), 0);
    }
}
