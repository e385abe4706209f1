//! Year/version mirror table operations
//!
//! Each row keeps the raw manufacturer string plus the normalized year and
//! fuel columns extracted at sync time. A NULL year means the string
//! carried no recoverable year.

use garagem_common::Result;
use sqlx::SqlitePool;

/// Mirrored catalog year/version entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearRecord {
    pub brand_code: String,
    pub model_code: String,
    pub code: String,
    pub name: String,
    pub year: Option<i64>,
    pub fuel_type: Option<String>,
    pub active: bool,
}

impl YearRecord {
    pub fn new(
        brand_code: impl Into<String>,
        model_code: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
        year: Option<i64>,
        fuel_type: Option<String>,
    ) -> Self {
        Self {
            brand_code: brand_code.into(),
            model_code: model_code.into(),
            code: code.into(),
            name: name.into(),
            year,
            fuel_type,
            active: true,
        }
    }
}

/// Upsert a year entry (idempotent on `(brand_code, model_code, code)`)
pub async fn upsert_year(pool: &SqlitePool, year: &YearRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO catalog_years (
            brand_code, model_code, code, name, year, fuel_type, active,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(brand_code, model_code, code) DO UPDATE SET
            name = excluded.name,
            year = excluded.year,
            fuel_type = excluded.fuel_type,
            active = excluded.active,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&year.brand_code)
    .bind(&year.model_code)
    .bind(&year.code)
    .bind(&year.name)
    .bind(year.year)
    .bind(&year.fuel_type)
    .bind(year.active)
    .execute(pool)
    .await?;

    Ok(())
}

/// All mirrored year entries of one model, in insertion order
pub async fn list_years_by_model(
    pool: &SqlitePool,
    brand_code: &str,
    model_code: &str,
) -> Result<Vec<YearRecord>> {
    let rows: Vec<(String, String, String, String, Option<i64>, Option<String>, bool)> =
        sqlx::query_as(
            "SELECT brand_code, model_code, code, name, year, fuel_type, active
             FROM catalog_years
             WHERE brand_code = ? AND model_code = ?
             ORDER BY rowid",
        )
        .bind(brand_code)
        .bind(model_code)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(
            |(brand_code, model_code, code, name, year, fuel_type, active)| YearRecord {
                brand_code,
                model_code,
                code,
                name,
                year,
                fuel_type,
                active,
            },
        )
        .collect())
}

/// Codes of all mirrored year entries of one model
pub async fn list_year_codes(
    pool: &SqlitePool,
    brand_code: &str,
    model_code: &str,
) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT code FROM catalog_years WHERE brand_code = ? AND model_code = ?",
    )
    .bind(brand_code)
    .bind(model_code)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(code,)| code).collect())
}

/// Number of mirrored year entries across all models
pub async fn count_years(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_years")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_upsert_and_list_years() {
        let pool = test_pool().await;

        let year = YearRecord::new(
            "25",
            "001",
            "2022-3",
            "Civic LX 2.0 Flex 2022",
            Some(2022),
            Some("Flex".to_string()),
        );
        upsert_year(&pool, &year).await.unwrap();

        let years = list_years_by_model(&pool, "25", "001").await.unwrap();
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].year, Some(2022));
        assert_eq!(years[0].fuel_type.as_deref(), Some("Flex"));
    }

    #[tokio::test]
    async fn test_year_can_be_absent() {
        let pool = test_pool().await;

        let year = YearRecord::new("25", "001", "0000-1", "Civic LX Flex", None, None);
        upsert_year(&pool, &year).await.unwrap();

        let years = list_years_by_model(&pool, "25", "001").await.unwrap();
        assert_eq!(years[0].year, None);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let pool = test_pool().await;

        let year = YearRecord::new("25", "001", "2022-3", "Civic LX 2022", Some(2022), None);
        upsert_year(&pool, &year).await.unwrap();
        upsert_year(&pool, &year).await.unwrap();

        assert_eq!(count_years(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_year_codes_scoped_to_model() {
        let pool = test_pool().await;

        upsert_year(&pool, &YearRecord::new("25", "001", "2022-3", "Civic 2022", Some(2022), None))
            .await
            .unwrap();
        upsert_year(&pool, &YearRecord::new("25", "002", "2021-1", "City 2021", Some(2021), None))
            .await
            .unwrap();

        let codes = list_year_codes(&pool, "25", "001").await.unwrap();
        assert_eq!(codes, vec!["2022-3".to_string()]);
    }
}
