//! Price mirror table operations
//!
//! Populated on demand by price lookups; one row per selection per
//! reference month.

use garagem_common::Result;
use sqlx::SqlitePool;

/// Mirrored price quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub brand_code: String,
    pub model_code: String,
    pub year_code: String,
    pub fipe_code: Option<String>,
    pub price: Option<String>,
    pub fuel: Option<String>,
    pub reference_month: String,
}

/// Upsert a price quote (idempotent on the selection + reference month)
pub async fn upsert_price(pool: &SqlitePool, record: &PriceRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO catalog_prices (
            brand_code, model_code, year_code, fipe_code, price, fuel,
            reference_month, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(brand_code, model_code, year_code, reference_month) DO UPDATE SET
            fipe_code = excluded.fipe_code,
            price = excluded.price,
            fuel = excluded.fuel
        "#,
    )
    .bind(&record.brand_code)
    .bind(&record.model_code)
    .bind(&record.year_code)
    .bind(&record.fipe_code)
    .bind(&record.price)
    .bind(&record.fuel)
    .bind(&record.reference_month)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recently stored quote for a selection, if any
pub async fn latest_price(
    pool: &SqlitePool,
    brand_code: &str,
    model_code: &str,
    year_code: &str,
) -> Result<Option<PriceRecord>> {
    let row: Option<(String, String, String, Option<String>, Option<String>, Option<String>, String)> =
        sqlx::query_as(
            "SELECT brand_code, model_code, year_code, fipe_code, price, fuel, reference_month
             FROM catalog_prices
             WHERE brand_code = ? AND model_code = ? AND year_code = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1",
        )
        .bind(brand_code)
        .bind(model_code)
        .bind(year_code)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(
        |(brand_code, model_code, year_code, fipe_code, price, fuel, reference_month)| {
            PriceRecord {
                brand_code,
                model_code,
                year_code,
                fipe_code,
                price,
                fuel,
                reference_month,
            }
        },
    ))
}
