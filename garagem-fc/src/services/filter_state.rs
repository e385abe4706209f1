//! Dynamic filter state machine
//!
//! Maintains the brand/model/year/version selection and recomputes the
//! valid option set for every dependent filter. Selecting a field clears
//! everything downstream of it. Option computation never surfaces an
//! error: a failed stage logs and returns whatever was computed so far,
//! with empty lists for unreached stages.

use crate::models::{FilterField, FilterOptions, FilterState};
use crate::services::catalog::CatalogService;
use crate::services::normalizer;
use std::sync::Arc;

/// Computes filter options against the catalog read service
pub struct FilterEngine {
    catalog: Arc<CatalogService>,
}

impl FilterEngine {
    pub fn new(catalog: Arc<CatalogService>) -> Self {
        Self { catalog }
    }

    /// Apply one selection change, clearing invalidated downstream fields
    ///
    /// | Changed field | Cleared fields                       |
    /// |---------------|--------------------------------------|
    /// | brand         | model, year, version, fipe_code      |
    /// | model         | year, version, fipe_code             |
    /// | year          | version, fipe_code                   |
    /// | version       | fipe_code                            |
    pub fn update_filter(
        field: FilterField,
        value: Option<&str>,
        state: &FilterState,
    ) -> FilterState {
        let mut next = state.clone();

        match field {
            FilterField::Brand => {
                next.brand = value.map(str::to_string);
                next.model = None;
                next.year = None;
                next.version = None;
                next.fipe_code = None;
            }
            FilterField::Model => {
                next.model = value.map(str::to_string);
                next.year = None;
                next.version = None;
                next.fipe_code = None;
            }
            FilterField::Year => {
                next.year = value.and_then(|v| v.parse().ok());
                next.version = None;
                next.fipe_code = None;
            }
            FilterField::Version => {
                next.version = value.map(str::to_string);
                next.fipe_code = None;
            }
        }

        next
    }

    /// All four selection fields populated
    pub fn is_selection_complete(state: &FilterState) -> bool {
        state.is_complete()
    }

    /// Recompute the valid option lists for the current selection
    ///
    /// Brands are always computed; each later stage only when everything
    /// it depends on is selected. Failures stop the cascade but return the
    /// partial result instead of an error.
    pub async fn filter_options(&self, state: &FilterState) -> FilterOptions {
        let mut options = FilterOptions::default();

        let brands = match self.catalog.get_brands().await {
            Ok(brands) => brands,
            Err(e) => {
                tracing::warn!("Brand options unavailable: {}", e);
                return options;
            }
        };
        options.brands = brands.iter().map(|brand| brand.name.clone()).collect();

        let Some(selected_brand) = &state.brand else {
            return options;
        };
        // Resolve the displayed brand name back to its code
        let Some(brand_code) = brands
            .iter()
            .find(|brand| brand.name.eq_ignore_ascii_case(selected_brand))
            .map(|brand| brand.code.clone())
        else {
            tracing::debug!(brand = %selected_brand, "Selected brand not in catalog");
            return options;
        };

        let raw_models = match self.catalog.get_models(&brand_code).await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!(brand = %brand_code, "Model options unavailable: {}", e);
                return options;
            }
        };
        options.models = normalizer::process_models(&raw_models);

        let Some(selected_model) = &state.model else {
            return options;
        };
        let Some(model_code) = normalizer::best_model_match(&raw_models, selected_model) else {
            tracing::debug!(model = %selected_model, "Selected model not in catalog");
            return options;
        };

        match self
            .catalog
            .get_unique_years(&brand_code, &model_code, selected_model)
            .await
        {
            Ok(years) => options.years = years,
            Err(e) => {
                tracing::warn!(model = %model_code, "Year options unavailable: {}", e);
                return options;
            }
        }

        let Some(selected_year) = state.year else {
            return options;
        };

        match self
            .catalog
            .get_versions_by_year(&brand_code, &model_code, selected_model, selected_year)
            .await
        {
            Ok(versions) => options.versions = versions,
            Err(e) => {
                tracing::warn!(model = %model_code, year = selected_year, "Version options unavailable: {}", e);
            }
        }

        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_state() -> FilterState {
        FilterState {
            brand: Some("Honda".to_string()),
            model: Some("Civic".to_string()),
            year: Some(2022),
            version: Some("LX".to_string()),
            fipe_code: Some("026116-5".to_string()),
        }
    }

    #[test]
    fn test_brand_change_clears_everything_downstream() {
        let next = FilterEngine::update_filter(FilterField::Brand, Some("Fiat"), &full_state());

        assert_eq!(next.brand.as_deref(), Some("Fiat"));
        assert!(next.model.is_none());
        assert!(next.year.is_none());
        assert!(next.version.is_none());
        assert!(next.fipe_code.is_none());
    }

    #[test]
    fn test_model_change_keeps_brand() {
        let next = FilterEngine::update_filter(FilterField::Model, Some("City"), &full_state());

        assert_eq!(next.brand.as_deref(), Some("Honda"));
        assert_eq!(next.model.as_deref(), Some("City"));
        assert!(next.year.is_none());
        assert!(next.version.is_none());
        assert!(next.fipe_code.is_none());
    }

    #[test]
    fn test_year_change_keeps_brand_and_model() {
        let next = FilterEngine::update_filter(FilterField::Year, Some("2021"), &full_state());

        assert_eq!(next.brand.as_deref(), Some("Honda"));
        assert_eq!(next.model.as_deref(), Some("Civic"));
        assert_eq!(next.year, Some(2021));
        assert!(next.version.is_none());
        assert!(next.fipe_code.is_none());
    }

    #[test]
    fn test_version_change_clears_only_fipe_code() {
        let next = FilterEngine::update_filter(FilterField::Version, Some("EXL"), &full_state());

        assert_eq!(next.year, Some(2022));
        assert_eq!(next.version.as_deref(), Some("EXL"));
        assert!(next.fipe_code.is_none());
    }

    #[test]
    fn test_clearing_a_field_with_none() {
        let next = FilterEngine::update_filter(FilterField::Model, None, &full_state());

        assert_eq!(next.brand.as_deref(), Some("Honda"));
        assert!(next.model.is_none());
        assert!(next.year.is_none());
    }

    #[test]
    fn test_unparseable_year_clears_the_selection() {
        let next = FilterEngine::update_filter(FilterField::Year, Some("unknown"), &full_state());
        assert!(next.year.is_none());
    }

    #[test]
    fn test_selection_complete() {
        assert!(FilterEngine::is_selection_complete(&full_state()));

        let partial = FilterEngine::update_filter(FilterField::Year, None, &full_state());
        assert!(!FilterEngine::is_selection_complete(&partial));
    }
}
