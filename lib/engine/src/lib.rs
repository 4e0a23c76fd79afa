//! # cacao-engine
//!
//! Explainable product matching and cross-sell recommendation over a
//! read-only [`cacao_catalog::Catalog`].
//!
//! A search runs in up to two phases:
//!
//! 1. **Strict**: hard filters straight from the requirement (technical
//!    targets within ±5%)
//! 2. **Relaxed**: only when Phase 1 finds fewer than `min_strict_matches`;
//!    alternative delivery formats, 80% of the protein minimum, ±20%
//!    technical windows and the whole region group are accepted, and every
//!    accepted deviation is reported per result
//!
//! Results from both phases are merged by material code (strict records win)
//! and ranked by a weighted, renormalized attribute score.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cacao_catalog::{Catalog, CatalogPaths};
//! use cacao_engine::{CrossSellRecommender, RequirementProfile, SearchEngine};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(Catalog::load(&CatalogPaths::from_dir("reference_data")).unwrap());
//! let engine = SearchEngine::new(catalog.clone());
//!
//! let requirement = RequirementProfile::new()
//!     .with_base_type("Dark")
//!     .with_delivery_format("Drops")
//!     .with_min_protein(8.0);
//! let matches = engine.find_matching_products(&requirement);
//!
//! if let Some(top) = matches.first() {
//!     let pairs = CrossSellRecommender::new(catalog).recommend(&top.material_code).unwrap();
//!     println!("{} pairs well with {} products", top.material_code, pairs.len());
//! }
//! ```

pub mod config;
pub mod cross_sell;
pub mod error;
pub mod explain;
pub mod orchestrator;
pub mod pairing;
pub mod pipeline;
pub mod progress;
pub mod region;
pub mod relaxed;
pub mod requirement;
pub mod scorer;
pub mod strict;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{CrossSellConfig, EngineConfig, SearchConfig};
pub use cross_sell::CrossSellRecommender;
pub use error::{EngineError, Result};
pub use explain::{
    CompatibilityBreakdown, CrossSellResult, FilterStep, FilterStepKind, MatchResult,
    RelaxationDetail, RelaxedAttribute, RelaxedValue, ResultSummary, ScoreBreakdown, SearchPhase,
    SearchReport, SearchStats, SearchStatus,
};
pub use orchestrator::{SearchEngine, SearchOptions};
pub use progress::{NoopProgress, ProgressSink, SearchStep, TracingProgress};
pub use relaxed::{RelaxedProfile, RelaxedSearch};
pub use requirement::{RawRequirementProfile, RequirementProfile};
pub use scorer::{MatchScorer, ScoringPolicy};
pub use strict::StrictSearch;
