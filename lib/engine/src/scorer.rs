//! Match scorer
//!
//! Computes a [0, 1] score for one product against one requirement, along
//! with the per-attribute sub-scores that produced it.

use crate::explain::ScoreBreakdown;
use crate::region::RegionAffinity;
use crate::requirement::RequirementProfile;
use cacao_catalog::{BaseType, Catalog, DeliveryFormat, ProductType, ProductView, TechnicalAttribute};
use cacao_similarity::{
    are_alternative_formats, attribute_score, base_type_similarity, clamp_unit, label_contains,
    product_type_similarity, shortfall_score, AttributeError, MatchAttribute, MatchWeights,
    ScoreMode, Tolerance, NEUTRAL_SCORE,
};
use std::collections::BTreeMap;
use tracing::debug;

/// How a single scoring pass treats unrequested attributes and numeric
/// distances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pub mode: ScoreMode,
    /// Fraction of the target used as tolerance in requirement mode
    pub tolerance: f64,
}

impl ScoringPolicy {
    pub fn requirement(tolerance: f64) -> Self {
        Self { mode: ScoreMode::Requirement, tolerance }
    }

    pub fn similarity() -> Self {
        Self { mode: ScoreMode::Similarity, tolerance: 0.0 }
    }

    fn numeric_tolerance(&self) -> Tolerance {
        match self.mode {
            ScoreMode::Requirement => Tolerance::TargetFraction(self.tolerance),
            ScoreMode::Similarity => Tolerance::CatalogRange,
        }
    }
}

/// Weighted multi-attribute scorer over one catalog
#[derive(Debug, Clone)]
pub struct MatchScorer<'c> {
    catalog: &'c Catalog,
    weights: MatchWeights,
    alternative_format_score: f64,
}

impl<'c> MatchScorer<'c> {
    pub fn new(catalog: &'c Catalog, weights: MatchWeights) -> Self {
        Self { catalog, weights, alternative_format_score: 0.7 }
    }

    pub fn with_alternative_format_score(mut self, score: f64) -> Self {
        self.alternative_format_score = score;
        self
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    /// Score `view` against `requirement`
    ///
    /// Returns (score, breakdown). Only attributes that produced a sub-score
    /// appear in the breakdown and take part in the weighted mean.
    pub fn score(
        &self,
        view: &ProductView<'_>,
        requirement: &RequirementProfile,
        policy: ScoringPolicy,
    ) -> (f64, ScoreBreakdown) {
        let mut breakdown = BTreeMap::new();

        for attribute in MatchAttribute::ALL {
            let sub_score = match self.attribute_score(attribute, view, requirement, policy) {
                Ok(Some(score)) => Some(clamp_unit(score)),
                Ok(None) if policy.mode == ScoreMode::Similarity => Some(NEUTRAL_SCORE),
                Ok(None) => None,
                Err(e) => {
                    debug!(material_code = view.material_code(), error = %e, "attribute skipped");
                    None
                }
            };
            if let Some(score) = sub_score {
                breakdown.insert(attribute, score);
            }
        }

        let scored: Vec<(MatchAttribute, f64)> = breakdown.iter().map(|(a, s)| (*a, *s)).collect();
        (self.weights.combine(&scored), breakdown)
    }

    /// `Ok(None)` when the attribute was not requested
    fn attribute_score(
        &self,
        attribute: MatchAttribute,
        view: &ProductView<'_>,
        requirement: &RequirementProfile,
        policy: ScoringPolicy,
    ) -> Result<Option<f64>, AttributeError> {
        let product = view.product;
        let score = match attribute {
            MatchAttribute::BaseType => requirement
                .base_type
                .as_deref()
                .map(|requested| base_type_score(requested, &product.base_type)),
            MatchAttribute::ProductType => requirement
                .product_type
                .as_deref()
                .map(|requested| product_type_score(requested, &product.product_type)),
            MatchAttribute::DeliveryFormat => requirement
                .delivery_format
                .as_deref()
                .map(|requested| self.delivery_format_score(requested, &product.moulding_type)),
            MatchAttribute::TechnicalSpecs => {
                if requirement.technical_specs.is_empty() {
                    None
                } else {
                    Some(self.technical_score(view, &requirement.technical_specs, policy)?)
                }
            }
            MatchAttribute::Protein => match requirement.min_protein_percentage {
                Some(minimum) => Some(self.protein_score(view, minimum, policy)?),
                None => None,
            },
            MatchAttribute::Region => requirement
                .region
                .as_deref()
                .map(|requested| RegionAffinity::of(requested, product).score()),
        };
        Ok(score)
    }

    fn delivery_format_score(&self, requested: &str, moulding_type: &str) -> f64 {
        if label_contains(moulding_type, requested) {
            return 1.0;
        }
        match (DeliveryFormat::from_label(requested), DeliveryFormat::from_label(moulding_type)) {
            (Some(a), Some(b)) if are_alternative_formats(a, b) => self.alternative_format_score,
            _ => 0.0,
        }
    }

    /// Mean closeness over the requested attributes the product carries
    fn technical_score(
        &self,
        view: &ProductView<'_>,
        specs: &BTreeMap<TechnicalAttribute, f64>,
        policy: ScoringPolicy,
    ) -> Result<f64, AttributeError> {
        let tolerance = policy.numeric_tolerance();
        let mut scores = Vec::with_capacity(specs.len());

        for (attribute, target) in specs {
            let Some(value) = view.product.technical(*attribute) else {
                let err = AttributeError::MissingValue {
                    attribute: attribute.to_string(),
                    material_code: view.material_code().to_string(),
                };
                debug!(error = %err, "technical attribute skipped");
                continue;
            };
            match attribute_score(value, *target, tolerance, self.catalog.technical_range(*attribute)) {
                Some(score) => scores.push(score),
                None => {
                    let err = AttributeError::NoRange(attribute.to_string());
                    debug!(error = %err, "technical attribute skipped");
                }
            }
        }

        if scores.is_empty() {
            return Err(AttributeError::MissingValue {
                attribute: MatchAttribute::TechnicalSpecs.to_string(),
                material_code: view.material_code().to_string(),
            });
        }
        Ok(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    fn protein_score(
        &self,
        view: &ProductView<'_>,
        minimum: f64,
        policy: ScoringPolicy,
    ) -> Result<f64, AttributeError> {
        let protein = view.protein_g().ok_or_else(|| AttributeError::MissingValue {
            attribute: MatchAttribute::Protein.to_string(),
            material_code: view.material_code().to_string(),
        })?;

        let range = match policy.mode {
            ScoreMode::Requirement => minimum.abs() * policy.tolerance,
            ScoreMode::Similarity => {
                let (min, max) = self
                    .catalog
                    .protein_range()
                    .ok_or_else(|| AttributeError::NoRange(MatchAttribute::Protein.to_string()))?;
                max - min
            }
        };
        Ok(shortfall_score(protein, minimum, range))
    }
}

fn base_type_score(requested: &str, candidate: &str) -> f64 {
    match (BaseType::from_label(requested), BaseType::from_label(candidate)) {
        (Some(a), Some(b)) => base_type_similarity(a, b),
        _ if label_contains(candidate, requested) => 1.0,
        _ => 0.0,
    }
}

fn product_type_score(requested: &str, candidate: &str) -> f64 {
    if label_contains(candidate, requested) {
        return 1.0;
    }
    match (ProductType::from_label(requested), ProductType::from_label(candidate)) {
        (Some(a), Some(b)) => product_type_similarity(a, b),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog, product, ProductSpec};

    #[test]
    fn test_four_attribute_split() {
        let catalog = catalog(vec![ProductSpec::new("BE1001", "Dark", "Drops").protein(8.0).viscosity(41.0)]);
        let view = catalog.view(0).unwrap();
        let scorer = MatchScorer::new(&catalog, MatchWeights::default());

        // Viscosity 41 on target 40 with 5% tolerance scores 0.5
        let requirement = RequirementProfile::new()
            .with_base_type("Dark")
            .with_product_type("Standard")
            .with_technical(TechnicalAttribute::Viscosity, 40.0)
            .with_min_protein(8.0);
        let (score, breakdown) = scorer.score(&view, &requirement, ScoringPolicy::requirement(0.05));

        assert_eq!(breakdown.len(), 4);
        assert!((breakdown[&MatchAttribute::TechnicalSpecs] - 0.5).abs() < 1e-9);
        let expected = 0.30 + 0.20 + 0.30 * breakdown[&MatchAttribute::TechnicalSpecs] + 0.20;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_absent_attributes_do_not_dilute() {
        let catalog = catalog(vec![ProductSpec::new("BE1001", "Dark Premium", "Drops")]);
        let view = catalog.view(0).unwrap();
        let scorer = MatchScorer::new(&catalog, MatchWeights::default());

        let requirement = RequirementProfile::new().with_base_type("dark");
        let (score, breakdown) = scorer.score(&view, &requirement, ScoringPolicy::requirement(0.05));
        assert_eq!(score, 1.0);
        assert_eq!(breakdown.len(), 1);

        let (score, breakdown) = scorer.score(&view, &RequirementProfile::new(), ScoringPolicy::requirement(0.05));
        assert_eq!(score, 0.0);
        assert!(breakdown.is_empty());
    }

    #[test]
    fn test_similarity_mode_is_neutral_for_unrequested() {
        let catalog = catalog(vec![ProductSpec::new("BE1001", "Dark", "Drops")]);
        let view = catalog.view(0).unwrap();
        let scorer = MatchScorer::new(&catalog, MatchWeights::default());

        let requirement = RequirementProfile::new().with_base_type("Dark");
        let (score, breakdown) = scorer.score(&view, &requirement, ScoringPolicy::similarity());

        assert_eq!(breakdown[&MatchAttribute::Region], NEUTRAL_SCORE);
        assert_eq!(breakdown.len(), MatchAttribute::ALL.len());
        assert!(score > 0.5 && score < 1.0);
    }

    #[test]
    fn test_format_credit() {
        let catalog = catalog(vec![
            ProductSpec::new("BE1", "Dark", "Drops"),
            ProductSpec::new("BE2", "Dark", "Block"),
        ]);
        let scorer = MatchScorer::new(&catalog, MatchWeights::default()).with_alternative_format_score(0.6);
        let requirement = RequirementProfile::new().with_delivery_format("drops");
        let policy = ScoringPolicy::requirement(0.2);

        let (exact, _) = scorer.score(&catalog.view(0).unwrap(), &requirement, policy);
        let (alternative, _) = scorer.score(&catalog.view(1).unwrap(), &requirement, policy);
        assert_eq!(exact, 1.0);
        assert!((alternative - 0.6).abs() < 1e-9);

        let odd = RequirementProfile::new().with_delivery_format("Chunks");
        let (none, breakdown) = scorer.score(&catalog.view(1).unwrap(), &odd, policy);
        assert_eq!(none, 0.0);
        assert_eq!(breakdown[&MatchAttribute::DeliveryFormat], 0.0);
    }

    #[test]
    fn test_matrix_fallbacks() {
        assert_eq!(base_type_score("Milk", "White Premium"), 0.6);
        assert_eq!(base_type_score("Caramel", "Caramel Gold"), 1.0);
        assert_eq!(base_type_score("Caramel", "Dark"), 0.0);
        assert_eq!(product_type_score("Premium", "Premium Organic"), 1.0);
        assert_eq!(product_type_score("Premium", "Standard"), 0.5);
        assert_eq!(product_type_score("Organic", "Standard"), 0.0);
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let catalog = catalog(vec![ProductSpec::new("BE1001", "Dark", "Drops")]);
        let view = catalog.view(0).unwrap();
        let scorer = MatchScorer::new(&catalog, MatchWeights::default());

        let requirement = RequirementProfile::new()
            .with_base_type("Dark")
            .with_technical(TechnicalAttribute::Ph, 6.0)
            .with_min_protein(5.0);
        let (score, breakdown) = scorer.score(&view, &requirement, ScoringPolicy::requirement(0.05));

        assert_eq!(breakdown.len(), 1);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_protein_shortfall_and_region() {
        let catalog = catalog(vec![ProductSpec::new("NL1001", "Milk", "Callets").protein(7.0)]);
        let view = catalog.view(0).unwrap();
        let scorer = MatchScorer::new(&catalog, MatchWeights::default());

        let requirement = RequirementProfile::new().with_min_protein(8.0).with_region("BE");
        let (_, breakdown) = scorer.score(&view, &requirement, ScoringPolicy::requirement(0.2));

        // Shortfall of 1 over a tolerance of 1.6
        assert!((breakdown[&MatchAttribute::Protein] - 0.375).abs() < 1e-9);
        assert_eq!(breakdown[&MatchAttribute::Region], 0.5);
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let catalog = catalog(vec![product("US1", "Ruby", "Sugar-Free", "Easymelt")]);
        let view = catalog.view(0).unwrap();
        let scorer = MatchScorer::new(&catalog, MatchWeights::default());
        let requirement = RequirementProfile::new()
            .with_base_type("Dark")
            .with_product_type("Premium")
            .with_delivery_format("Drops")
            .with_technical(TechnicalAttribute::Viscosity, -3.0)
            .with_region("JP");

        for policy in [ScoringPolicy::requirement(0.05), ScoringPolicy::similarity()] {
            let (score, breakdown) = scorer.score(&view, &requirement, policy);
            assert!((0.0..=1.0).contains(&score));
            assert!(breakdown.values().all(|s| (0.0..=1.0).contains(s)));
        }
    }
}
