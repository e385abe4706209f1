//! End-to-end filter flow tests
//!
//! Walks the listing-creation selection sequence against one shared app
//! state, the way the dropdown UI drives it.

mod helpers;

use garagem_fc::models::{FilterField, FilterState};
use garagem_fc::services::{CatalogCache, FilterEngine};
use garagem_fc::AppState;
use std::sync::Arc;

#[tokio::test]
async fn test_listing_creation_selection_sequence() {
    let state = helpers::test_state().await;

    // Nothing selected: only brands are offered
    let filter_state = FilterState::default();
    let options = state.filters.filter_options(&filter_state).await;
    assert_eq!(options.brands, vec!["Honda".to_string(), "Fiat".to_string()]);
    assert!(options.models.is_empty());

    // Select a brand: model options appear
    let filter_state =
        FilterEngine::update_filter(FilterField::Brand, Some("Honda"), &filter_state);
    let options = state.filters.filter_options(&filter_state).await;
    let model_names: Vec<&str> = options.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(model_names, vec!["Civic", "City"]);
    assert!(options.years.is_empty());

    // Select a model: year options appear, newest first
    let filter_state =
        FilterEngine::update_filter(FilterField::Model, Some("Civic"), &filter_state);
    let options = state.filters.filter_options(&filter_state).await;
    assert_eq!(options.years, vec![2022, 2021]);
    assert!(options.versions.is_empty());

    // Select a year: versions for that year appear
    let filter_state = FilterEngine::update_filter(FilterField::Year, Some("2022"), &filter_state);
    let options = state.filters.filter_options(&filter_state).await;
    let version_names: Vec<&str> = options.versions.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(version_names, vec!["LX", "EXL"]);

    // Select a version: the selection is complete and priceable
    let filter_state =
        FilterEngine::update_filter(FilterField::Version, Some("LX"), &filter_state);
    assert!(FilterEngine::is_selection_complete(&filter_state));

    let version_code = &options.versions[0].code;
    let detail = state.catalog.get_price("25", "001", version_code).await.unwrap();
    assert_eq!(detail.fipe_code, "026116-5");
}

#[tokio::test]
async fn test_changing_brand_restarts_the_cascade() {
    let state = helpers::test_state().await;

    let filter_state = FilterState {
        brand: Some("Honda".to_string()),
        model: Some("Civic".to_string()),
        year: Some(2022),
        version: Some("LX".to_string()),
        fipe_code: Some("026116-5".to_string()),
    };

    let filter_state =
        FilterEngine::update_filter(FilterField::Brand, Some("Fiat"), &filter_state);
    assert!(filter_state.model.is_none());

    let options = state.filters.filter_options(&filter_state).await;
    let model_names: Vec<&str> = options.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(model_names, vec!["Argo"]);
    assert!(options.years.is_empty());
}

#[tokio::test]
async fn test_mirror_serves_filters_when_upstream_down() {
    // Populate the mirror while the upstream is healthy
    let state = helpers::test_state().await;
    state.sync.full_sync().await.unwrap();

    // Rebuild the service stack over the same mirror with the upstream gone
    let degraded = AppState::new(
        state.db.clone(),
        Arc::new(helpers::DownCatalog),
        Arc::new(CatalogCache::memory_only()),
    );

    let filter_state = FilterState {
        brand: Some("Honda".to_string()),
        model: Some("Civic".to_string()),
        year: None,
        version: None,
        fipe_code: None,
    };
    let options = degraded.filters.filter_options(&filter_state).await;

    // Brand, model, and year options all came out of the relational mirror
    assert_eq!(options.brands.len(), 2);
    assert!(!options.models.is_empty());
    assert_eq!(options.years, vec![2022, 2021]);
}

#[tokio::test]
async fn test_upstream_down_with_empty_mirror_yields_empty_options() {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    garagem_fc::db::init_tables(&pool).await.unwrap();

    let state = AppState::new(
        pool,
        Arc::new(helpers::DownCatalog),
        Arc::new(CatalogCache::memory_only()),
    );

    // Total failure renders empty option lists, not an error
    let options = state.filters.filter_options(&FilterState::default()).await;
    assert!(options.brands.is_empty());
    assert!(options.models.is_empty());
    assert!(options.years.is_empty());
    assert!(options.versions.is_empty());
}
