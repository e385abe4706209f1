//! Catalog sync orchestrator
//!
//! Keeps the relational mirror eventually consistent with the remote
//! catalog. Per-item failures are collected into the run report and never
//! abort the loop; the pipeline prioritizes partial completeness over
//! all-or-nothing correctness. Brand fan-out runs through a bounded worker
//! pool so independent brands sync concurrently without flooding the
//! upstream API.

use crate::db;
use crate::models::CatalogItem;
use crate::services::cache::CatalogCache;
use crate::services::fipe_client::CatalogSource;
use crate::services::normalizer;
use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use garagem_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Concurrent brand workers during a sync run
const SYNC_WORKERS: usize = 4;

/// Mirror age beyond which a new sync is due
const SYNC_MAX_AGE_DAYS: i64 = 7;

/// Sync flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Full,
    Incremental,
}

/// Outcome of one sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: Uuid,
    pub mode: SyncMode,
    pub brands_synced: usize,
    pub models_synced: usize,
    pub years_synced: usize,
    /// Per-item failure descriptions; a populated list still means the run
    /// completed
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Per-brand tally folded into the report
#[derive(Debug, Default)]
struct BrandOutcome {
    models: usize,
    years: usize,
    errors: Vec<String>,
}

/// Orchestrates full and incremental mirror synchronization
pub struct SyncOrchestrator {
    source: Arc<dyn CatalogSource>,
    cache: Arc<CatalogCache>,
    db: SqlitePool,
}

impl SyncOrchestrator {
    pub fn new(source: Arc<dyn CatalogSource>, cache: Arc<CatalogCache>, db: SqlitePool) -> Self {
        Self { source, cache, db }
    }

    /// Wholesale resync: every brand, model, and year entry is upserted
    ///
    /// Clears the local cache tiers at the end so subsequent reads observe
    /// fresh mirror data.
    pub async fn full_sync(&self) -> Result<SyncReport> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        tracing::info!(run_id = %run_id, "Starting full catalog sync");

        let brands = self
            .source
            .brands()
            .await
            .map_err(|e| garagem_common::Error::Internal(format!("Brand fetch failed: {}", e)))?;

        let mut brands_synced = 0usize;
        let mut errors = Vec::new();

        for brand in &brands {
            match db::brands::upsert_brand(
                &self.db,
                &db::brands::BrandRecord::new(&brand.code, &brand.name),
            )
            .await
            {
                Ok(()) => brands_synced += 1,
                Err(e) => errors.push(format!("brand {}: {}", brand.code, e)),
            }
        }

        // Bounded fan-out: each worker walks one brand's models and years
        let outcomes: Vec<BrandOutcome> = futures::stream::iter(brands.iter().cloned())
            .map(|brand| async move { self.sync_brand(&brand, false).await })
            .buffer_unordered(SYNC_WORKERS)
            .collect()
            .await;

        let mut models_synced = 0usize;
        let mut years_synced = 0usize;
        for outcome in outcomes {
            models_synced += outcome.models;
            years_synced += outcome.years;
            errors.extend(outcome.errors);
        }

        // Fresh mirror data must win over anything cached earlier
        self.cache.clear().await;
        db::settings::set_last_sync_at(&self.db, Utc::now()).await?;

        let report = SyncReport {
            run_id,
            mode: SyncMode::Full,
            brands_synced,
            models_synced,
            years_synced,
            errors,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            run_id = %run_id,
            brands = report.brands_synced,
            models = report.models_synced,
            years = report.years_synced,
            errors = report.errors.len(),
            "Full catalog sync completed"
        );

        Ok(report)
    }

    /// Insert-only sync: diffs remote vs. local by code per stage
    ///
    /// Locally-only records (removed upstream) are never pruned.
    pub async fn incremental_sync(&self) -> Result<SyncReport> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        tracing::info!(run_id = %run_id, "Starting incremental catalog sync");

        let brands = self
            .source
            .brands()
            .await
            .map_err(|e| garagem_common::Error::Internal(format!("Brand fetch failed: {}", e)))?;

        let local_brands: HashSet<String> =
            db::brands::list_brand_codes(&self.db).await?.into_iter().collect();

        let mut brands_synced = 0usize;
        let mut errors = Vec::new();

        for brand in &brands {
            if local_brands.contains(&brand.code) {
                continue;
            }
            match db::brands::upsert_brand(
                &self.db,
                &db::brands::BrandRecord::new(&brand.code, &brand.name),
            )
            .await
            {
                Ok(()) => brands_synced += 1,
                Err(e) => errors.push(format!("brand {}: {}", brand.code, e)),
            }
        }

        let outcomes: Vec<BrandOutcome> = futures::stream::iter(brands.iter().cloned())
            .map(|brand| async move { self.sync_brand(&brand, true).await })
            .buffer_unordered(SYNC_WORKERS)
            .collect()
            .await;

        let mut models_synced = 0usize;
        let mut years_synced = 0usize;
        for outcome in outcomes {
            models_synced += outcome.models;
            years_synced += outcome.years;
            errors.extend(outcome.errors);
        }

        db::settings::set_last_sync_at(&self.db, Utc::now()).await?;

        let report = SyncReport {
            run_id,
            mode: SyncMode::Incremental,
            brands_synced,
            models_synced,
            years_synced,
            errors,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            run_id = %run_id,
            new_brands = report.brands_synced,
            new_models = report.models_synced,
            new_years = report.years_synced,
            errors = report.errors.len(),
            "Incremental catalog sync completed"
        );

        Ok(report)
    }

    /// Walk one brand's models and years
    ///
    /// `incremental` switches between wholesale upsert (full sync) and
    /// insert-only-new. Remote calls within a brand run sequentially;
    /// concurrency lives at the brand fan-out.
    async fn sync_brand(&self, brand: &CatalogItem, incremental: bool) -> BrandOutcome {
        let mut outcome = BrandOutcome::default();

        let models = match self.source.models(&brand.code).await {
            Ok(models) => models,
            Err(e) => {
                outcome.errors.push(format!("brand {}: {}", brand.code, e));
                return outcome;
            }
        };

        let local_models: HashSet<String> = if incremental {
            match db::models::list_model_codes(&self.db, &brand.code).await {
                Ok(codes) => codes.into_iter().collect(),
                Err(e) => {
                    outcome.errors.push(format!("brand {}: {}", brand.code, e));
                    return outcome;
                }
            }
        } else {
            HashSet::new()
        };

        for model in &models {
            if !incremental || !local_models.contains(&model.code) {
                match db::models::upsert_model(
                    &self.db,
                    &db::models::ModelRecord::new(&brand.code, &model.code, &model.name),
                )
                .await
                {
                    Ok(()) => outcome.models += 1,
                    Err(e) => {
                        outcome
                            .errors
                            .push(format!("model {}/{}: {}", brand.code, model.code, e));
                        continue;
                    }
                }
            }

            let years = match self.source.years(&brand.code, &model.code).await {
                Ok(years) => years,
                Err(e) => {
                    outcome
                        .errors
                        .push(format!("model {}/{}: {}", brand.code, model.code, e));
                    continue;
                }
            };

            let local_years: HashSet<String> = if incremental {
                match db::years::list_year_codes(&self.db, &brand.code, &model.code).await {
                    Ok(codes) => codes.into_iter().collect(),
                    Err(e) => {
                        outcome
                            .errors
                            .push(format!("model {}/{}: {}", brand.code, model.code, e));
                        continue;
                    }
                }
            } else {
                HashSet::new()
            };

            for year in &years {
                if incremental && local_years.contains(&year.code) {
                    continue;
                }
                let record = db::years::YearRecord::new(
                    &brand.code,
                    &model.code,
                    &year.code,
                    &year.name,
                    normalizer::extract_year(&year.name).map(i64::from),
                    normalizer::extract_fuel_type(&year.name).map(|fuel| fuel.label().to_string()),
                );
                match db::years::upsert_year(&self.db, &record).await {
                    Ok(()) => outcome.years += 1,
                    Err(e) => outcome.errors.push(format!(
                        "year {}/{}/{}: {}",
                        brand.code, model.code, year.code, e
                    )),
                }
            }
        }

        outcome
    }

    /// True when the mirror is empty or the last completed sync is older
    /// than the max age
    pub async fn needs_sync(&self) -> Result<bool> {
        if db::brands::count_brands(&self.db).await? == 0 {
            return Ok(true);
        }

        match db::settings::get_last_sync_at(&self.db).await? {
            None => Ok(true),
            Some(last) => Ok(Utc::now() - last > Duration::days(SYNC_MAX_AGE_DAYS)),
        }
    }

    /// Startup hook: sync when due, swallow and log every failure
    pub async fn auto_sync(&self) {
        match self.needs_sync().await {
            Ok(false) => {
                tracing::debug!("Catalog mirror is fresh, skipping auto-sync");
            }
            Ok(true) => match self.incremental_sync().await {
                Ok(report) => {
                    if !report.errors.is_empty() {
                        tracing::warn!(
                            run_id = %report.run_id,
                            errors = report.errors.len(),
                            "Auto-sync completed with partial failures"
                        );
                    }
                }
                Err(e) => tracing::warn!("Auto-sync failed: {}", e),
            },
            Err(e) => tracing::warn!("Auto-sync freshness check failed: {}", e),
        }
    }
}
