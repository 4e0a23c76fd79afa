//! # cacao-match
//!
//! Explainable product matching and cross-sell recommendation over a
//! read-only chocolate product catalog.
//!
//! A requirement profile (base type, product type, delivery format,
//! technical targets, minimum protein, region, market segment or
//! application) is matched in two phases. Phase 1 applies the requirement
//! as hard filters; when it finds fewer than three products, Phase 2
//! relaxes the delivery format, protein minimum, technical windows and
//! region, and every relaxation is reported next to the result it
//! admitted. The top match can then be fed to the cross-sell recommender.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! cacao-match --data-dir reference_data match --requirement requirement.json
//! cacao-match --data-dir reference_data cross-sell BE1001
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use cacao_match::prelude::*;
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(Catalog::load(&CatalogPaths::from_dir("reference_data")).unwrap());
//! let engine = SearchEngine::new(catalog);
//!
//! let requirement = RequirementProfile::new()
//!     .with_base_type("Dark")
//!     .with_delivery_format("Drops")
//!     .with_min_protein(8.0);
//! let report = engine.search(&requirement, &SearchOptions::default());
//! for result in &report.matches {
//!     println!("{} {:.2} {:?}", result.material_code, result.match_score, result.search_phase);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `cacao-catalog` - CSV loading, join indexes, row predicates
//! - `cacao-similarity` - similarity/complementarity tables, distance scores, weights
//! - `cacao-engine` - scorer, strict/relaxed search, orchestrator, cross-sell

// Re-export catalog types
pub use cacao_catalog::{
    BaseType, Catalog, CatalogPaths, CatalogSummary, DeliveryFormat, Filter, FilterCondition,
    ProductRecord, ProductType, ProductView, TechnicalAttribute,
};

// Re-export similarity models
pub use cacao_similarity::{CompatibilityWeights, MatchAttribute, MatchWeights, ScoreMode};

// Re-export the engine
pub use cacao_engine::{
    CrossSellRecommender, CrossSellResult, EngineConfig, EngineError, MatchResult,
    RelaxationDetail, RelaxedAttribute, RequirementProfile, SearchEngine, SearchOptions,
    SearchPhase, SearchReport, SearchStatus,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Catalog, CatalogPaths, CrossSellRecommender, CrossSellResult, EngineConfig, EngineError,
        MatchResult, RequirementProfile, SearchEngine, SearchOptions, SearchPhase, SearchReport,
        SearchStatus,
    };
}
