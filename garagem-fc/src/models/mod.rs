//! Data model for the FIPE catalog service

pub mod catalog;
pub mod filter;

pub use catalog::{CatalogItem, FuelType, PriceDetail, PricePoint, ProcessedModel, ProcessedVersion};
pub use filter::{FilterField, FilterOptions, FilterState};
