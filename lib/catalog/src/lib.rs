//! # cacao-catalog
//!
//! The read-only reference catalog behind cacao-match.
//!
//! - [`Catalog`] - products in file order, joined by material code to
//!   nutrition and allergen rows, with precomputed technical ranges
//! - [`CatalogPaths`] / [`ReferenceTables`] - CSV loading
//! - [`FilterCondition`] - row predicates over a joined [`ProductView`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use cacao_catalog::{Catalog, CatalogPaths, TechnicalAttribute};
//!
//! let catalog = Catalog::load(&CatalogPaths::from_dir("reference_data")).unwrap();
//! let (min, max) = catalog.technical_range(TechnicalAttribute::Viscosity).unwrap();
//! println!("{} products, viscosity {}..{}", catalog.len(), min, max);
//! ```

pub mod catalog;
pub mod error;
pub mod filter;
pub mod loader;
pub mod product;

pub use catalog::{Catalog, CatalogSummary};
pub use error::{Error, Result};
pub use filter::{Filter, FilterCondition, ProductField};
pub use loader::{parse_number, CatalogPaths, ReferenceTables};
pub use product::{
    AllergenRecord, BaseType, DeliveryFormat, NutritionRecord, ProductDetails, ProductRecord,
    ProductType, ProductView, TechnicalAttribute, TechniqueParameters,
};
