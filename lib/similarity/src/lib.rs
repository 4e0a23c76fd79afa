//! # cacao-similarity
//!
//! Attribute similarity models for catalog matching.
//!
//! This crate holds everything about "how alike" or "how well paired" two
//! attribute values are, independent of any particular catalog:
//!
//! - **Tables**: base-type similarity and complementarity matrices,
//!   product-type similarity, delivery-format alternatives, market segments
//!   and region groups
//! - **Distances**: normalized numeric closeness under a target-relative or
//!   catalog-relative tolerance
//! - **Schema**: relative weight tables with present-attribute renormalization
//!
//! ## Example
//!
//! ```rust
//! use cacao_similarity::{attribute_score, MatchAttribute, MatchWeights, Tolerance};
//!
//! // Viscosity 41 against a target of 40 with the strict 5% tolerance
//! let tech = attribute_score(41.0, 40.0, Tolerance::TargetFraction(0.05), None).unwrap();
//!
//! let weights = MatchWeights::default();
//! let score = weights.combine(&[
//!     (MatchAttribute::BaseType, 1.0),
//!     (MatchAttribute::TechnicalSpecs, tech),
//! ]);
//! assert!(score > 0.5 && score < 1.0);
//! ```

pub mod distance;
pub mod schema;
pub mod tables;

pub use distance::{
    attribute_score, clamp_unit, deviation_pct, label_contains, normalized_distance_score,
    shortfall_score, tolerance_range, within_fraction,
};
pub use schema::{
    AttributeError, CompatibilityComponent, CompatibilityWeights, MatchAttribute, MatchWeights,
    ScoreMode, Tolerance, WeightError, NEUTRAL_SCORE,
};
pub use tables::{
    are_alternative_formats, base_type_complementarity, base_type_similarity,
    delivery_format_alternatives, is_region_group, product_type_similarity, region_group,
    segment_applications, segment_of_application, MARKET_SEGMENTS, REGION_GROUPS,
};
