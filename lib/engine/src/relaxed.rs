//! Phase 2: relaxed search
//!
//! Loosens delivery format, protein minimum, technical windows and
//! (optionally) region, then re-runs the pipeline. Base type, product type
//! and market segment are never loosened. Candidates are scored against the
//! original requirement and every loosened constraint a candidate depends on
//! is reported.

use crate::config::SearchConfig;
use crate::explain::{
    FilterStepKind, MatchResult, RelaxationDetail, RelaxedAttribute, SearchPhase, SearchStats,
};
use crate::pipeline::{segment_condition, technical_window, FilterPipeline};
use crate::region::{exact_region_condition, region_group_condition, RegionAffinity};
use crate::requirement::RequirementProfile;
use crate::scorer::{MatchScorer, ScoringPolicy};
use cacao_catalog::{Catalog, DeliveryFormat, FilterCondition, ProductField, ProductView, TechnicalAttribute};
use cacao_similarity::{
    delivery_format_alternatives, deviation_pct, label_contains, within_fraction, MatchWeights,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Loosened bounds derived from a requirement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelaxedProfile {
    pub original: RequirementProfile,
    /// The requested format followed by its alternatives
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delivery_formats: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_protein: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub technical_bounds: BTreeMap<TechnicalAttribute, (f64, f64)>,
    /// Whether the region step admits the whole region group
    pub region_expanded: bool,
}

impl RelaxedProfile {
    pub fn from_requirement(requirement: &RequirementProfile, config: &SearchConfig) -> Self {
        let delivery_formats = match requirement.delivery_format.as_deref() {
            Some(requested) => {
                let mut formats = vec![requested.to_string()];
                if let Some(format) = DeliveryFormat::from_label(requested) {
                    formats.extend(delivery_format_alternatives(format).iter().map(|f| f.to_string()));
                }
                formats
            }
            None => Vec::new(),
        };

        let band = config.technical_relaxation;
        let technical_bounds = requirement
            .technical_specs
            .iter()
            .map(|(attribute, target)| {
                let (a, b) = (target * (1.0 - band), target * (1.0 + band));
                (*attribute, (a.min(b), a.max(b)))
            })
            .collect();

        let region_expanded = config.relax_region
            && requirement
                .region
                .as_deref()
                .and_then(region_group_condition)
                .is_some();

        Self {
            original: requirement.clone(),
            delivery_formats,
            min_protein: requirement.min_protein_percentage.map(|m| m * config.protein_relaxation),
            technical_bounds,
            region_expanded,
        }
    }

    /// Same step order as the strict pipeline, with loosened bounds
    pub fn pipeline(&self) -> FilterPipeline {
        let requirement = &self.original;
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
        if !self.delivery_formats.is_empty() {
            pipeline.push(
                FilterStepKind::DeliveryFormat,
                FilterCondition::Or(
                    self.delivery_formats
                        .iter()
                        .map(|f| FilterCondition::contains(ProductField::MouldingType, f))
                        .collect(),
                ),
            );
        }
        if !self.technical_bounds.is_empty() {
            pipeline.push(
                FilterStepKind::TechnicalSpecs,
                FilterCondition::And(
                    self.technical_bounds
                        .iter()
                        .map(|(attribute, (lo, hi))| technical_window(*attribute, *lo, *hi))
                        .collect(),
                ),
            );
        }
        if let Some(min) = self.min_protein {
            pipeline.push(FilterStepKind::Protein, FilterCondition::AtLeast { field: ProductField::Protein, min });
        }
        if let Some(region) = requirement.region.as_deref() {
            let condition = if self.region_expanded {
                region_group_condition(region).unwrap_or_else(|| exact_region_condition(region))
            } else {
                exact_region_condition(region)
            };
            pipeline.push(FilterStepKind::Region, condition);
        }
        pipeline
    }

    /// Every loosened constraint `view` would have failed under the strict
    /// bounds
    pub fn relaxation_details(&self, view: &ProductView<'_>, strict_tolerance: f64) -> Vec<RelaxationDetail> {
        let requirement = &self.original;
        let product = view.product;
        let mut details = Vec::new();

        if let Some(requested) = requirement.delivery_format.as_deref() {
            if !label_contains(&product.moulding_type, requested) {
                details.push(RelaxationDetail::categorical(
                    RelaxedAttribute::DeliveryFormat,
                    requested,
                    &product.moulding_type,
                ));
            }
        }

        if let (Some(original), Some(accepted)) = (requirement.min_protein_percentage, view.protein_g()) {
            if accepted < original {
                details.push(RelaxationDetail::numeric(
                    RelaxedAttribute::ProteinContent,
                    original,
                    accepted,
                    deviation_pct(original, accepted),
                ));
            }
        }

        for (attribute, target) in &requirement.technical_specs {
            let Some(value) = product.technical(*attribute) else {
                continue;
            };
            if !within_fraction(value, *target, strict_tolerance) {
                details.push(RelaxationDetail::numeric(
                    RelaxedAttribute::Technical(*attribute),
                    *target,
                    value,
                    deviation_pct(*target, value),
                ));
            }
        }

        if let Some(requested) = requirement.region.as_deref() {
            if RegionAffinity::of(requested, product) != RegionAffinity::Exact {
                details.push(RelaxationDetail::categorical(
                    RelaxedAttribute::Region,
                    requested,
                    product.region_code(),
                ));
            }
        }

        details
    }
}

pub struct RelaxedSearch<'c> {
    catalog: &'c Catalog,
    scorer: MatchScorer<'c>,
    config: SearchConfig,
}

impl<'c> RelaxedSearch<'c> {
    pub fn new(catalog: &'c Catalog, weights: MatchWeights, config: SearchConfig) -> Self {
        let scorer = MatchScorer::new(catalog, weights)
            .with_alternative_format_score(config.alternative_format_score);
        Self { catalog, scorer, config }
    }

    pub fn relax(&self, requirement: &RequirementProfile) -> RelaxedProfile {
        RelaxedProfile::from_requirement(requirement, &self.config)
    }

    /// Scores against the original requirement at the relaxed tolerance
    pub fn search(&self, requirement: &RequirementProfile) -> (Vec<MatchResult>, SearchStats) {
        let profile = self.relax(requirement);
        let policy = ScoringPolicy::requirement(self.config.relaxed_tolerance);

        let (candidates, stats) = profile.pipeline().run(self.catalog);
        let mut results: Vec<MatchResult> = candidates
            .iter()
            .map(|view| {
                let (score, breakdown) = self.scorer.score(view, requirement, policy);
                let relaxation = profile.relaxation_details(view, self.config.strict_tolerance);
                MatchResult::new(view, score, breakdown, SearchPhase::Relaxed, self.config.exact_match_threshold)
                    .with_relaxation(relaxation)
            })
            .collect();

        results.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        debug!(matches = results.len(), "relaxed search finished");
        (results, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::RelaxedValue;
    use crate::strict::StrictSearch;
    use crate::testing::{catalog, ProductSpec};

    fn relaxed(catalog: &Catalog) -> RelaxedSearch<'_> {
        RelaxedSearch::new(catalog, MatchWeights::default(), SearchConfig::default())
    }

    #[test]
    fn test_profile_bounds() {
        let req = RequirementProfile::new()
            .with_delivery_format("Drops")
            .with_min_protein(8.0)
            .with_technical(TechnicalAttribute::Viscosity, 40.0)
            .with_region("BE");
        let profile = RelaxedProfile::from_requirement(&req, &SearchConfig::default());

        assert_eq!(profile.delivery_formats, vec!["Drops", "Block", "Callets", "Easymelt"]);
        assert!((profile.min_protein.unwrap() - 6.4).abs() < 1e-9);
        let (lo, hi) = profile.technical_bounds[&TechnicalAttribute::Viscosity];
        assert!((lo - 32.0).abs() < 1e-9 && (hi - 48.0).abs() < 1e-9);
        assert!(profile.region_expanded);

        let config = SearchConfig { relax_region: false, ..Default::default() };
        assert!(!RelaxedProfile::from_requirement(&req, &config).region_expanded);
        let unknown = RequirementProfile::new().with_region("LATAM");
        assert!(!RelaxedProfile::from_requirement(&unknown, &SearchConfig::default()).region_expanded);
    }

    #[test]
    fn test_never_relaxes_identity_attributes() {
        let catalog = catalog(vec![
            ProductSpec::new("BE1", "Milk", "Drops").protein(9.0),
            ProductSpec::new("BE2", "Dark", "Block").product_type("Premium").protein(9.0),
            ProductSpec::new("BE3", "Dark", "Block").category("Butter cakes").protein(9.0),
        ]);
        let req = RequirementProfile::new()
            .with_base_type("Dark")
            .with_product_type("Standard")
            .with_market_segment("Confectionery")
            .with_delivery_format("Drops");

        let (results, _) = relaxed(&catalog).search(&req);
        assert!(results.is_empty());
    }

    #[test]
    fn test_block_with_lower_protein_is_admitted_with_details() {
        let catalog = catalog(vec![
            ProductSpec::new("BE1", "Dark", "Drops").protein(8.5),
            ProductSpec::new("BE2", "Dark", "Block").protein(7.0),
            ProductSpec::new("BE3", "Dark", "Block").protein(6.0),
        ]);
        let req = RequirementProfile::new()
            .with_base_type("Dark")
            .with_delivery_format("Drops")
            .with_min_protein(8.0);

        let (results, stats) = relaxed(&catalog).search(&req);
        assert_eq!(stats.final_count, 2);
        assert!(results.iter().all(|r| r.search_phase == SearchPhase::Relaxed));

        let block = results.iter().find(|r| r.material_code == "BE2").unwrap();
        let format = block.relaxation(RelaxedAttribute::DeliveryFormat).unwrap();
        assert_eq!(format.original, RelaxedValue::Text("Drops".to_string()));
        assert_eq!(format.accepted, RelaxedValue::Text("Block".to_string()));
        assert!(format.delta_pct.is_none());

        let protein = block.relaxation(RelaxedAttribute::ProteinContent).unwrap();
        assert!((protein.delta_pct.unwrap() - 12.5).abs() < 1e-9);

        // The strict match needed no relaxation
        let drops = results.iter().find(|r| r.material_code == "BE1").unwrap();
        assert!(drops.relaxation_details.is_empty());
        assert!(!results.iter().any(|r| r.material_code == "BE3"));
    }

    #[test]
    fn test_strict_rejects_reappear_with_reason() {
        let catalog = catalog(vec![
            ProductSpec::new("BE1", "Dark", "Drops").viscosity(40.0),
            ProductSpec::new("BE2", "Dark", "Drops").viscosity(46.0),
            ProductSpec::new("NL3", "Dark", "Drops").viscosity(40.0),
            ProductSpec::new("US4", "Dark", "Drops").viscosity(40.0).region("NAM"),
        ]);
        let req = RequirementProfile::new()
            .with_technical(TechnicalAttribute::Viscosity, 40.0)
            .with_region("BE");

        let strict = StrictSearch::new(&catalog, MatchWeights::default(), SearchConfig::default());
        let (strict_results, _) = strict.search(&req);
        let (relaxed_results, _) = relaxed(&catalog).search(&req);

        for result in &relaxed_results {
            if strict_results.iter().any(|s| s.material_code == result.material_code) {
                continue;
            }
            assert!(!result.relaxation_details.is_empty(), "{}", result.material_code);
        }

        let tech = relaxed_results.iter().find(|r| r.material_code == "BE2").unwrap();
        let detail = tech.relaxation(RelaxedAttribute::Technical(TechnicalAttribute::Viscosity)).unwrap();
        assert!((detail.delta_pct.unwrap() - 15.0).abs() < 1e-9);

        let neighbour = relaxed_results.iter().find(|r| r.material_code == "NL3").unwrap();
        assert_eq!(
            neighbour.relaxation(RelaxedAttribute::Region).unwrap().accepted.as_text(),
            Some("NL")
        );
        assert!(!relaxed_results.iter().any(|r| r.material_code == "US4"));
    }

    #[test]
    fn test_scored_against_original_requirement() {
        let catalog = catalog(vec![ProductSpec::new("BE1", "Dark", "Drops").viscosity(44.0)]);
        let req = RequirementProfile::new().with_technical(TechnicalAttribute::Viscosity, 40.0);

        let (results, _) = relaxed(&catalog).search(&req);
        // 20% of 40 is 8, a miss of 4 scores 0.5
        assert!((results[0].match_score - 0.5).abs() < 1e-9);
        assert!(!results[0].is_exact_match);
    }
}
