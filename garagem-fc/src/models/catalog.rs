//! Catalog wire and derived types
//!
//! The remote price catalog speaks in raw code/name pairs; the derived
//! `Processed*` types carry the cleaned fields split out of the
//! manufacturer-formatted strings.

use serde::{Deserialize, Serialize};

/// Raw code/name pair as returned by every catalog listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// External system's identifier (brand code, model code, or year code)
    pub code: String,
    /// Display string; for models and years this is the full manufacturer
    /// string (e.g., "Civic LX 2.0 16V Flex Aut. 4p"), not a clean name
    pub name: String,
}

impl CatalogItem {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Fuel type vocabulary of the catalog
///
/// Matching is case- and accent-insensitive; display labels use the
/// catalog's own spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelType {
    #[serde(rename = "Flex")]
    Flex,
    #[serde(rename = "Gasolina")]
    Gasolina,
    #[serde(rename = "Diesel")]
    Diesel,
    #[serde(rename = "Etanol")]
    Etanol,
    #[serde(rename = "Híbrido")]
    Hibrido,
    #[serde(rename = "Elétrico")]
    Eletrico,
}

impl FuelType {
    /// Display label matching the catalog vocabulary
    pub fn label(&self) -> &'static str {
        match self {
            FuelType::Flex => "Flex",
            FuelType::Gasolina => "Gasolina",
            FuelType::Diesel => "Diesel",
            FuelType::Etanol => "Etanol",
            FuelType::Hibrido => "Híbrido",
            FuelType::Eletrico => "Elétrico",
        }
    }

    /// Parse a stored label back into the enum (accent- and case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        let folded = crate::services::normalizer::fold_for_match(label);
        match folded.as_str() {
            "flex" => Some(FuelType::Flex),
            "gasolina" => Some(FuelType::Gasolina),
            "diesel" => Some(FuelType::Diesel),
            "etanol" => Some(FuelType::Etanol),
            "hibrido" => Some(FuelType::Hibrido),
            "eletrico" => Some(FuelType::Eletrico),
            _ => None,
        }
    }
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Model after name cleaning; multiple raw models collapse to one
/// processed model when they share a clean name (first-seen wins)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedModel {
    /// Clean model name (first token or two of the raw string)
    pub name: String,
    /// Code of the first raw model seen with this clean name
    pub code: String,
    /// Original manufacturer string
    pub full_name: String,
}

/// Version/year entry after name cleaning, scoped to one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedVersion {
    /// Clean version name (technical tokens stripped)
    pub name: String,
    pub code: String,
    /// Original manufacturer string
    pub full_name: String,
    pub fuel_type: Option<FuelType>,
    /// Model year extracted from the string; `None` when the string
    /// carries no recoverable year
    pub year: Option<i32>,
}

/// Price detail payload for a fully-selected brand/model/year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDetail {
    pub brand: String,
    pub model: String,
    pub model_year: i32,
    pub fuel: String,
    pub fipe_code: String,
    /// Formatted price string as published by the catalog ("R$ 45.000,00")
    pub price: String,
    #[serde(default)]
    pub reference_month: String,
    #[serde(default)]
    pub price_history: Vec<PricePoint>,
}

/// One month of price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub month: String,
    pub price: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_type_labels_roundtrip() {
        for fuel in [
            FuelType::Flex,
            FuelType::Gasolina,
            FuelType::Diesel,
            FuelType::Etanol,
            FuelType::Hibrido,
            FuelType::Eletrico,
        ] {
            assert_eq!(FuelType::from_label(fuel.label()), Some(fuel));
        }
    }

    #[test]
    fn test_fuel_type_from_unaccented_label() {
        assert_eq!(FuelType::from_label("HIBRIDO"), Some(FuelType::Hibrido));
        assert_eq!(FuelType::from_label("eletrico"), Some(FuelType::Eletrico));
        assert_eq!(FuelType::from_label("querosene"), None);
    }

    #[test]
    fn test_price_detail_wire_format() {
        let json = r#"{
            "brand": "Honda",
            "model": "Civic LX 2.0",
            "modelYear": 2022,
            "fuel": "Flex",
            "fipeCode": "026116-5",
            "price": "R$ 120.000,00",
            "referenceMonth": "julho de 2026",
            "priceHistory": [{"month": "junho de 2026", "price": "R$ 119.000,00"}]
        }"#;

        let detail: PriceDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.model_year, 2022);
        assert_eq!(detail.fipe_code, "026116-5");
        assert_eq!(detail.price_history.len(), 1);
    }
}
