//! Filter selection state and option lists

use crate::models::{ProcessedModel, ProcessedVersion};
use serde::{Deserialize, Serialize};

/// Current brand/model/year/version selection
///
/// Selecting a field invalidates everything downstream of it; the cascade
/// is applied by the filter state machine, never ad hoc by callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub version: Option<String>,
    pub fipe_code: Option<String>,
}

impl FilterState {
    /// All four selection fields populated
    pub fn is_complete(&self) -> bool {
        self.brand.is_some() && self.model.is_some() && self.year.is_some() && self.version.is_some()
    }
}

/// Selectable filter field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Brand,
    Model,
    Year,
    Version,
}

/// Valid options for every filter, given the current selection
///
/// Stages that cannot be computed yet (or whose fetch failed) carry empty
/// lists; the caller never sees an error from option computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub brands: Vec<String>,
    pub models: Vec<ProcessedModel>,
    pub years: Vec<i32>,
    pub versions: Vec<ProcessedVersion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_complete_requires_all_four() {
        let mut state = FilterState {
            brand: Some("Honda".to_string()),
            model: Some("Civic".to_string()),
            year: Some(2022),
            version: None,
            fipe_code: None,
        };
        assert!(!state.is_complete());

        state.version = Some("LX".to_string());
        assert!(state.is_complete());
    }

    #[test]
    fn test_filter_state_wire_format() {
        let json = r#"{"brand": "Honda", "model": null, "year": null, "version": null, "fipeCode": null}"#;
        let state: FilterState = serde_json::from_str(json).unwrap();
        assert_eq!(state.brand.as_deref(), Some("Honda"));
        assert!(state.fipe_code.is_none());
    }
}
