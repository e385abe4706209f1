//! Catalog read service
//!
//! Read-through path for everything the filter UI consumes:
//! cache → remote fetch → cache write, with the relational mirror as the
//! fallback tier when the remote catalog is unreachable. Concurrent misses
//! on one key share a single in-flight fetch.

use crate::db;
use crate::models::{CatalogItem, PriceDetail, ProcessedModel, ProcessedVersion};
use crate::services::cache::{ttl, CatalogCache};
use crate::services::fipe_client::CatalogSource;
use crate::services::normalizer;
use garagem_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Read-through catalog access shared by the filter machine and the API
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    cache: Arc<CatalogCache>,
    db: SqlitePool,
    /// Per-key guards deduplicating concurrent fetches. The map grows with
    /// the key space, which is bounded by the catalog size.
    flights: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CatalogService {
    pub fn new(source: Arc<dyn CatalogSource>, cache: Arc<CatalogCache>, db: SqlitePool) -> Self {
        Self {
            source,
            cache,
            db,
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// All brands, cached for seven days
    pub async fn get_brands(&self) -> Result<Vec<CatalogItem>> {
        let key = "brands".to_string();

        if let Some(hit) = self.cache.get::<Vec<CatalogItem>>(&key).await {
            return Ok(hit);
        }

        let guard = self.flight_guard(&key).await;
        let _held = guard.lock().await;

        // Another caller may have settled the key while we waited
        if let Some(hit) = self.cache.get::<Vec<CatalogItem>>(&key).await {
            return Ok(hit);
        }

        match self.source.brands().await {
            Ok(items) => {
                self.cache.set(&key, &items, ttl::BRANDS).await;
                Ok(items)
            }
            Err(e) => {
                tracing::warn!("Brand fetch failed, falling back to mirror: {}", e);
                let mirror = db::brands::list_brands(&self.db).await?;
                if mirror.is_empty() {
                    return Err(Error::Internal(format!("Brand catalog unavailable: {}", e)));
                }
                Ok(mirror
                    .into_iter()
                    .map(|record| CatalogItem::new(record.code, record.name))
                    .collect())
            }
        }
    }

    /// Raw models of one brand, cached for three days
    pub async fn get_models(&self, brand_code: &str) -> Result<Vec<CatalogItem>> {
        let key = format!("models_{}", brand_code);

        if let Some(hit) = self.cache.get::<Vec<CatalogItem>>(&key).await {
            return Ok(hit);
        }

        let guard = self.flight_guard(&key).await;
        let _held = guard.lock().await;

        if let Some(hit) = self.cache.get::<Vec<CatalogItem>>(&key).await {
            return Ok(hit);
        }

        match self.source.models(brand_code).await {
            Ok(items) => {
                self.cache.set(&key, &items, ttl::MODELS).await;
                Ok(items)
            }
            Err(e) => {
                tracing::warn!(
                    brand = %brand_code,
                    "Model fetch failed, falling back to mirror: {}",
                    e
                );
                let mirror = db::models::list_models_by_brand(&self.db, brand_code).await?;
                if mirror.is_empty() {
                    return Err(Error::Internal(format!("Model catalog unavailable: {}", e)));
                }
                Ok(mirror
                    .into_iter()
                    .map(|record| CatalogItem::new(record.code, record.name))
                    .collect())
            }
        }
    }

    /// Models of one brand grouped by clean name
    pub async fn get_processed_models(&self, brand_code: &str) -> Result<Vec<ProcessedModel>> {
        let raw = self.get_models(brand_code).await?;
        Ok(normalizer::process_models(&raw))
    }

    /// Raw year/version entries of one model, cached for one day
    pub async fn get_years(&self, brand_code: &str, model_code: &str) -> Result<Vec<CatalogItem>> {
        let key = format!("years_{}_{}", brand_code, model_code);

        if let Some(hit) = self.cache.get::<Vec<CatalogItem>>(&key).await {
            return Ok(hit);
        }

        let guard = self.flight_guard(&key).await;
        let _held = guard.lock().await;

        if let Some(hit) = self.cache.get::<Vec<CatalogItem>>(&key).await {
            return Ok(hit);
        }

        match self.source.years(brand_code, model_code).await {
            Ok(items) => {
                self.cache.set(&key, &items, ttl::YEARS).await;
                Ok(items)
            }
            Err(e) => {
                tracing::warn!(
                    brand = %brand_code,
                    model = %model_code,
                    "Year fetch failed, falling back to mirror: {}",
                    e
                );
                let mirror = db::years::list_years_by_model(&self.db, brand_code, model_code).await?;
                if mirror.is_empty() {
                    return Err(Error::Internal(format!("Year catalog unavailable: {}", e)));
                }
                Ok(mirror
                    .into_iter()
                    .map(|record| CatalogItem::new(record.code, record.name))
                    .collect())
            }
        }
    }

    /// Distinct model years for a clean model selection, descending
    pub async fn get_unique_years(
        &self,
        brand_code: &str,
        model_code: &str,
        model_name: &str,
    ) -> Result<Vec<i32>> {
        let raw = self.get_years(brand_code, model_code).await?;
        Ok(normalizer::unique_years(&raw, model_name))
    }

    /// Versions of a clean model selection for one target year
    pub async fn get_versions_by_year(
        &self,
        brand_code: &str,
        model_code: &str,
        model_name: &str,
        target_year: i32,
    ) -> Result<Vec<ProcessedVersion>> {
        let raw = self.get_years(brand_code, model_code).await?;
        Ok(normalizer::versions_by_year(&raw, model_name, target_year))
    }

    /// Price detail for a fully-qualified selection, cached for one day
    ///
    /// Successful lookups are mirrored into `catalog_prices`; the mirror
    /// write is best-effort and never fails the lookup.
    pub async fn get_price(
        &self,
        brand_code: &str,
        model_code: &str,
        year_code: &str,
    ) -> Result<PriceDetail> {
        let key = format!("price_{}_{}_{}", brand_code, model_code, year_code);

        if let Some(hit) = self.cache.get::<PriceDetail>(&key).await {
            return Ok(hit);
        }

        let guard = self.flight_guard(&key).await;
        let _held = guard.lock().await;

        if let Some(hit) = self.cache.get::<PriceDetail>(&key).await {
            return Ok(hit);
        }

        let detail = self
            .source
            .price(brand_code, model_code, year_code)
            .await
            .map_err(|e| Error::Internal(format!("Price lookup failed: {}", e)))?;

        self.cache.set(&key, &detail, ttl::DEFAULT).await;

        let record = db::prices::PriceRecord {
            brand_code: brand_code.to_string(),
            model_code: model_code.to_string(),
            year_code: year_code.to_string(),
            fipe_code: Some(detail.fipe_code.clone()),
            price: Some(detail.price.clone()),
            fuel: Some(detail.fuel.clone()),
            reference_month: detail.reference_month.clone(),
        };
        if let Err(e) = db::prices::upsert_price(&self.db, &record).await {
            tracing::warn!("Price mirror write failed: {}", e);
        }

        Ok(detail)
    }

    /// Drop all cached catalog data (both local tiers)
    pub async fn invalidate_cache(&self) {
        self.cache.clear().await;
    }

    async fn flight_guard(&self, key: &str) -> Arc<Mutex<()>> {
        let mut flights = self.flights.lock().await;
        flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::services::fipe_client::FipeError;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type FipeResult<T> = std::result::Result<T, FipeError>;

    /// Stub source counting remote calls, optionally failing everything
    struct StubSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer<T>(&self, data: T) -> FipeResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FipeError::Network("connection refused".to_string()))
            } else {
                Ok(data)
            }
        }
    }

    impl CatalogSource for StubSource {
        fn brands(&self) -> BoxFuture<'_, FipeResult<Vec<CatalogItem>>> {
            Box::pin(async move {
                self.answer(vec![
                    CatalogItem::new("25", "Honda"),
                    CatalogItem::new("21", "Fiat"),
                ])
            })
        }

        fn models<'a>(
            &'a self,
            _brand_code: &'a str,
        ) -> BoxFuture<'a, FipeResult<Vec<CatalogItem>>> {
            Box::pin(async move {
                self.answer(vec![
                    CatalogItem::new("001", "Civic LX 2.0 16V"),
                    CatalogItem::new("002", "Civic EXL 2.0 CVT"),
                ])
            })
        }

        fn years<'a>(
            &'a self,
            _brand_code: &'a str,
            _model_code: &'a str,
        ) -> BoxFuture<'a, FipeResult<Vec<CatalogItem>>> {
            Box::pin(async move {
                self.answer(vec![
                    CatalogItem::new("2022-3", "Civic LX 2.0 Flex 2022"),
                    CatalogItem::new("2021-3", "Civic LX 2.0 Flex 2021"),
                ])
            })
        }

        fn price<'a>(
            &'a self,
            _brand_code: &'a str,
            _model_code: &'a str,
            _year_code: &'a str,
        ) -> BoxFuture<'a, FipeResult<PriceDetail>> {
            Box::pin(async move {
                self.answer(PriceDetail {
                    brand: "Honda".to_string(),
                    model: "Civic LX 2.0".to_string(),
                    model_year: 2022,
                    fuel: "Flex".to_string(),
                    fipe_code: "026116-5".to_string(),
                    price: "R$ 120.000,00".to_string(),
                    reference_month: "julho de 2026".to_string(),
                    price_history: Vec::new(),
                })
            })
        }
    }

    async fn service_with(source: Arc<StubSource>) -> CatalogService {
        let pool = test_pool().await;
        CatalogService::new(source, Arc::new(CatalogCache::memory_only()), pool)
    }

    #[tokio::test]
    async fn test_cold_cache_fetches_then_serves_cached() {
        let source = Arc::new(StubSource::new());
        let service = service_with(source.clone()).await;

        let first = service.get_brands().await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(source.call_count(), 1);

        // Within TTL: no second remote call
        let second = service.get_brands().await.unwrap();
        assert_eq!(second, first);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let source = Arc::new(StubSource::new());
        let service = Arc::new(service_with(source.clone()).await);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.get_brands().await })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_mirror() {
        let source = Arc::new(StubSource::failing());
        let pool = test_pool().await;
        db::brands::upsert_brand(&pool, &db::brands::BrandRecord::new("25", "Honda"))
            .await
            .unwrap();

        let service =
            CatalogService::new(source, Arc::new(CatalogCache::memory_only()), pool);

        let brands = service.get_brands().await.unwrap();
        assert_eq!(brands, vec![CatalogItem::new("25", "Honda")]);
    }

    #[tokio::test]
    async fn test_remote_failure_with_empty_mirror_errors() {
        let source = Arc::new(StubSource::failing());
        let service = service_with(source).await;

        assert!(service.get_brands().await.is_err());
    }

    #[tokio::test]
    async fn test_unique_years_through_cache() {
        let source = Arc::new(StubSource::new());
        let service = service_with(source.clone()).await;

        let years = service.get_unique_years("25", "001", "Civic").await.unwrap();
        assert_eq!(years, vec![2022, 2021]);

        // Second query for the same model reuses the cached year list
        let versions = service
            .get_versions_by_year("25", "001", "Civic", 2022)
            .await
            .unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].code, "2022-3");
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_price_lookup_mirrors_quote() {
        let source = Arc::new(StubSource::new());
        let pool = test_pool().await;
        let service = CatalogService::new(
            source,
            Arc::new(CatalogCache::memory_only()),
            pool.clone(),
        );

        let detail = service.get_price("25", "001", "2022-3").await.unwrap();
        assert_eq!(detail.fipe_code, "026116-5");

        let mirrored = db::prices::latest_price(&pool, "25", "001", "2022-3")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mirrored.price.as_deref(), Some("R$ 120.000,00"));
    }

    #[tokio::test]
    async fn test_invalidate_cache_forces_refetch() {
        let source = Arc::new(StubSource::new());
        let service = service_with(source.clone()).await;

        service.get_brands().await.unwrap();
        service.invalidate_cache().await;
        service.get_brands().await.unwrap();

        assert_eq!(source.call_count(), 2);
    }
}
