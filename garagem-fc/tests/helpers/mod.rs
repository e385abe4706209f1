//! Shared fixtures for integration tests

// Not every suite uses every fixture
#![allow(dead_code)]

use futures::future::BoxFuture;
use garagem_fc::models::{CatalogItem, PriceDetail};
use garagem_fc::services::{CatalogCache, CatalogSource, FipeError};
use garagem_fc::AppState;
use std::sync::Arc;

/// Fixed two-brand catalog used across the integration suites
pub struct StubCatalog;

impl CatalogSource for StubCatalog {
    fn brands(&self) -> BoxFuture<'_, Result<Vec<CatalogItem>, FipeError>> {
        Box::pin(async move {
            Ok(vec![
                CatalogItem::new("25", "Honda"),
                CatalogItem::new("21", "Fiat"),
            ])
        })
    }

    fn models<'a>(
        &'a self,
        brand_code: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CatalogItem>, FipeError>> {
        Box::pin(async move {
            match brand_code {
                "25" => Ok(vec![
                    CatalogItem::new("001", "Civic LX 2.0 16V Flex Aut. 4p"),
                    CatalogItem::new("002", "Civic EXL 2.0 16V Flex Aut. 4p"),
                    CatalogItem::new("003", "City EX 1.5 Flex"),
                ]),
                "21" => Ok(vec![CatalogItem::new("900", "Argo Drive 1.0 Flex")]),
                other => Err(FipeError::NotFound(format!("brand {}", other))),
            }
        })
    }

    fn years<'a>(
        &'a self,
        _brand_code: &'a str,
        model_code: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CatalogItem>, FipeError>> {
        Box::pin(async move {
            match model_code {
                "001" => Ok(vec![
                    CatalogItem::new("2022-3", "Civic LX 2.0 16V Flex Aut. 2022"),
                    CatalogItem::new("2021-3", "Civic LX 2.0 16V Flex Aut. 2021"),
                    CatalogItem::new("2022-5", "Civic EXL 2.0 16V Flex Aut. 2022"),
                ]),
                "900" => Ok(vec![CatalogItem::new("2020-1", "Argo Drive 1.0 Flex 2020")]),
                _ => Ok(Vec::new()),
            }
        })
    }

    fn price<'a>(
        &'a self,
        brand_code: &'a str,
        model_code: &'a str,
        year_code: &'a str,
    ) -> BoxFuture<'a, Result<PriceDetail, FipeError>> {
        Box::pin(async move {
            if (brand_code, model_code, year_code) == ("25", "001", "2022-3") {
                Ok(PriceDetail {
                    brand: "Honda".to_string(),
                    model: "Civic LX 2.0 16V Flex Aut.".to_string(),
                    model_year: 2022,
                    fuel: "Flex".to_string(),
                    fipe_code: "026116-5".to_string(),
                    price: "R$ 120.000,00".to_string(),
                    reference_month: "julho de 2026".to_string(),
                    price_history: Vec::new(),
                })
            } else {
                Err(FipeError::NotFound(format!(
                    "{}/{}/{}",
                    brand_code, model_code, year_code
                )))
            }
        })
    }
}

/// Catalog source with the upstream entirely unreachable
pub struct DownCatalog;

impl CatalogSource for DownCatalog {
    fn brands(&self) -> BoxFuture<'_, Result<Vec<CatalogItem>, FipeError>> {
        Box::pin(async move { Err(FipeError::Network("connection refused".to_string())) })
    }

    fn models<'a>(
        &'a self,
        _brand_code: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CatalogItem>, FipeError>> {
        Box::pin(async move { Err(FipeError::Network("connection refused".to_string())) })
    }

    fn years<'a>(
        &'a self,
        _brand_code: &'a str,
        _model_code: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CatalogItem>, FipeError>> {
        Box::pin(async move { Err(FipeError::Network("connection refused".to_string())) })
    }

    fn price<'a>(
        &'a self,
        _brand_code: &'a str,
        _model_code: &'a str,
        _year_code: &'a str,
    ) -> BoxFuture<'a, Result<PriceDetail, FipeError>> {
        Box::pin(async move { Err(FipeError::Network("connection refused".to_string())) })
    }
}

/// App state over an in-memory database, a memory-only cache, and the stub
/// catalog
pub async fn test_state() -> AppState {
    // One connection only: every connection to :memory: is its own database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory database");
    garagem_fc::db::init_tables(&pool)
        .await
        .expect("Schema initialization failed");

    AppState::new(
        pool,
        Arc::new(StubCatalog),
        Arc::new(CatalogCache::memory_only()),
    )
}
