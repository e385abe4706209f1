//! Model mirror table operations

use garagem_common::Result;
use sqlx::SqlitePool;

/// Mirrored catalog model; `name` is the raw manufacturer string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecord {
    pub brand_code: String,
    pub code: String,
    pub name: String,
    pub active: bool,
}

impl ModelRecord {
    pub fn new(
        brand_code: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            brand_code: brand_code.into(),
            code: code.into(),
            name: name.into(),
            active: true,
        }
    }
}

/// Upsert a model (idempotent on `(brand_code, code)`)
pub async fn upsert_model(pool: &SqlitePool, model: &ModelRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO catalog_models (brand_code, code, name, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(brand_code, code) DO UPDATE SET
            name = excluded.name,
            active = excluded.active,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&model.brand_code)
    .bind(&model.code)
    .bind(&model.name)
    .bind(model.active)
    .execute(pool)
    .await?;

    Ok(())
}

/// All mirrored models of one brand, in insertion order
pub async fn list_models_by_brand(pool: &SqlitePool, brand_code: &str) -> Result<Vec<ModelRecord>> {
    let rows: Vec<(String, String, String, bool)> = sqlx::query_as(
        "SELECT brand_code, code, name, active FROM catalog_models
         WHERE brand_code = ? ORDER BY rowid",
    )
    .bind(brand_code)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(brand_code, code, name, active)| ModelRecord {
            brand_code,
            code,
            name,
            active,
        })
        .collect())
}

/// Codes of all mirrored models of one brand
pub async fn list_model_codes(pool: &SqlitePool, brand_code: &str) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT code FROM catalog_models WHERE brand_code = ?")
            .bind(brand_code)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(code,)| code).collect())
}

/// Number of mirrored models across all brands
pub async fn count_models(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_models")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
