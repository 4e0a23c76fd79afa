//! Phase 1: strict search
//!
//! Hard filters built directly from the requirement, then scoring with the
//! strict tolerance. Pure: the same requirement over the same catalog always
//! yields the same ranked list.

use crate::config::SearchConfig;
use crate::explain::{FilterStepKind, MatchResult, SearchPhase, SearchStats};
use crate::pipeline::{segment_condition, technical_condition, FilterPipeline};
use crate::region::exact_region_condition;
use crate::requirement::RequirementProfile;
use crate::scorer::{MatchScorer, ScoringPolicy};
use cacao_catalog::{Catalog, FilterCondition, ProductField};
use cacao_similarity::MatchWeights;
use tracing::debug;

pub struct StrictSearch<'c> {
    catalog: &'c Catalog,
    scorer: MatchScorer<'c>,
    config: SearchConfig,
}

impl<'c> StrictSearch<'c> {
    pub fn new(catalog: &'c Catalog, weights: MatchWeights, config: SearchConfig) -> Self {
        let scorer = MatchScorer::new(catalog, weights)
            .with_alternative_format_score(config.alternative_format_score);
        Self { catalog, scorer, config }
    }

    /// Filters in application order: segment, product type, base type,
    /// delivery format, technical window, protein minimum, region
    pub fn pipeline(&self, requirement: &RequirementProfile) -> FilterPipeline {
        let mut pipeline = FilterPipeline::new();

        if let Some(condition) = segment_condition(requirement) {
            pipeline.push(FilterStepKind::MarketSegment, condition);
        }
        if let Some(product_type) = requirement.product_type.as_deref() {
            pipeline.push(
                FilterStepKind::ProductType,
                FilterCondition::contains(ProductField::ProductType, product_type),
            );
        }
        if let Some(base_type) = requirement.base_type.as_deref() {
            pipeline.push(FilterStepKind::BaseType, FilterCondition::contains(ProductField::BaseType, base_type));
        }
        if let Some(format) = requirement.delivery_format.as_deref() {
            pipeline.push(
                FilterStepKind::DeliveryFormat,
                FilterCondition::contains(ProductField::MouldingType, format),
            );
        }
        if let Some(condition) = technical_condition(requirement, self.config.strict_tolerance) {
            pipeline.push(FilterStepKind::TechnicalSpecs, condition);
        }
        if let Some(min) = requirement.min_protein_percentage {
            pipeline.push(FilterStepKind::Protein, FilterCondition::AtLeast { field: ProductField::Protein, min });
        }
        if let Some(region) = requirement.region.as_deref() {
            pipeline.push(FilterStepKind::Region, exact_region_condition(region));
        }
        pipeline
    }

    /// Always scores in requirement mode at the strict tolerance; unrequested
    /// attributes never contribute
    pub fn search(&self, requirement: &RequirementProfile) -> (Vec<MatchResult>, SearchStats) {
        let policy = ScoringPolicy::requirement(self.config.strict_tolerance);

        let (candidates, stats) = self.pipeline(requirement).run(self.catalog);
        let mut results: Vec<MatchResult> = candidates
            .iter()
            .map(|view| {
                let (score, breakdown) = self.scorer.score(view, requirement, policy);
                MatchResult::new(view, score, breakdown, SearchPhase::Strict, self.config.exact_match_threshold)
            })
            .collect();

        // Stable: ties keep catalog row order
        results.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        debug!(matches = results.len(), "strict search finished");
        (results, stats)
    }
}
