//! Cross-sell recommender
//!
//! Ranks catalog products that pair well with a given product. Purely
//! rule-based: complementarity tables, technical closeness and shared
//! production region.

use crate::config::CrossSellConfig;
use crate::error::{EngineError, Result};
use crate::explain::{CompatibilityBreakdown, CrossSellResult};
use crate::pairing::pairing_suggestions;
use crate::progress::{NoopProgress, ProgressSink, SearchStep};
use cacao_catalog::{Catalog, ProductRecord, TechnicalAttribute};
use cacao_similarity::{
    base_type_complementarity, clamp_unit, normalized_distance_score, product_type_similarity,
    CompatibilityComponent, NEUTRAL_SCORE,
};
use std::sync::Arc;
use tracing::debug;

const TOP_N_RANGE: (usize, usize) = (3, 5);

// Attributes compared for technical compatibility
const TECHNICAL_PAIRING: [TechnicalAttribute; 2] = [TechnicalAttribute::Viscosity, TechnicalAttribute::Ph];

pub struct CrossSellRecommender {
    catalog: Arc<Catalog>,
    config: CrossSellConfig,
    progress: Arc<dyn ProgressSink>,
}

impl CrossSellRecommender {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(catalog, CrossSellConfig::default())
    }

    pub fn with_config(catalog: Arc<Catalog>, config: CrossSellConfig) -> Self {
        Self { catalog, config, progress: Arc::new(NoopProgress) }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Top complementary products for `material_code`, using the configured
    /// result count
    pub fn recommend(&self, material_code: &str) -> Result<Vec<CrossSellResult>> {
        self.recommend_top(material_code, self.config.top_n)
    }

    /// `top_n` is clamped to 3..=5
    pub fn recommend_top(&self, material_code: &str, top_n: usize) -> Result<Vec<CrossSellResult>> {
        self.progress.on_step_started(SearchStep::CrossSell);
        let Some(anchor) = self.catalog.product(material_code) else {
            let err = EngineError::NotFound(material_code.to_string());
            self.progress.on_step_failed(SearchStep::CrossSell, &err.to_string());
            return Err(err);
        };

        let mut results: Vec<CrossSellResult> = self
            .catalog
            .views()
            .filter(|view| view.product.material_code != anchor.material_code)
            .filter_map(|view| {
                let (score, breakdown) = self.compatibility(anchor, view.product);
                (score > self.config.min_score).then(|| CrossSellResult {
                    material_code: view.product.material_code.clone(),
                    description: view.product.description.clone(),
                    compatibility_score: score,
                    compatibility_breakdown: breakdown,
                    pairing_suggestions: pairing_suggestions(anchor, view.product),
                    details: view.details(),
                })
            })
            .collect();

        results.sort_by(|a, b| b.compatibility_score.total_cmp(&a.compatibility_score));
        results.truncate(top_n.clamp(TOP_N_RANGE.0, TOP_N_RANGE.1));
        debug!(material_code, recommendations = results.len(), "cross-sell ranked");
        self.progress.on_step_completed(SearchStep::CrossSell, results.len());
        Ok(results)
    }

    /// Weighted compatibility of `candidate` with `anchor`
    pub fn compatibility(&self, anchor: &ProductRecord, candidate: &ProductRecord) -> (f64, CompatibilityBreakdown) {
        let base = match (anchor.base_type_kind(), candidate.base_type_kind()) {
            (Some(a), Some(b)) => base_type_complementarity(a, b),
            _ => NEUTRAL_SCORE,
        };

        let product_type = match (anchor.product_type_kind(), candidate.product_type_kind()) {
            (Some(a), Some(b)) => product_type_similarity(a, b),
            _ if anchor.product_type.trim().eq_ignore_ascii_case(candidate.product_type.trim()) => 1.0,
            _ => NEUTRAL_SCORE,
        };

        let region = if anchor.region_code() == candidate.region_code() { 1.0 } else { 0.5 };

        let breakdown: CompatibilityBreakdown = [
            (CompatibilityComponent::BaseTypeComplementarity, base),
            (CompatibilityComponent::ProductTypeMatch, product_type),
            (CompatibilityComponent::TechnicalCompatibility, self.technical_compatibility(anchor, candidate)),
            (CompatibilityComponent::RegionAvailability, region),
        ]
        .into_iter()
        .map(|(component, score)| (component, clamp_unit(score)))
        .collect();

        let scored: Vec<_> = breakdown.iter().map(|(c, s)| (*c, *s)).collect();
        (self.config.weights.combine(&scored), breakdown)
    }

    /// Mean closeness of viscosity and pH over the catalog range; neutral
    /// when neither can be compared
    fn technical_compatibility(&self, anchor: &ProductRecord, candidate: &ProductRecord) -> f64 {
        let scores: Vec<f64> = TECHNICAL_PAIRING
            .iter()
            .filter_map(|attribute| {
                let a = anchor.technical(*attribute)?;
                let b = candidate.technical(*attribute)?;
                let (min, max) = self.catalog.technical_range(*attribute)?;
                Some(normalized_distance_score(a, b, max - min))
            })
            .collect();

        if scores.is_empty() {
            NEUTRAL_SCORE
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog, product};

    fn recommender(specs: Vec<crate::testing::ProductSpec>) -> CrossSellRecommender {
        CrossSellRecommender::new(Arc::new(catalog(specs)))
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        let r = recommender(vec![product("BE1", "Dark", "Premium", "Callets")]);
        assert!(matches!(r.recommend("BE1234"), Err(EngineError::NotFound(code)) if code == "BE1234"));
    }

    #[test]
    fn test_never_recommends_itself() {
        let r = recommender(vec![
            product("BE1", "Dark", "Premium", "Callets"),
            product("BE2", "Dark", "Premium", "Callets"),
            product("BE3", "Milk", "Premium", "Callets"),
        ]);
        let results = r.recommend("BE1").unwrap();
        assert!(results.iter().all(|c| c.material_code != "BE1"));
        assert!(results.iter().all(|c| c.compatibility_score > 0.4 && c.compatibility_score <= 1.0));
    }

    #[test]
    fn test_luxury_pairing() {
        let r = recommender(vec![
            product("BE1", "Dark", "Premium", "Callets").viscosity(4.0).ph(5.5),
            product("BE2", "Milk", "Premium", "Drops").viscosity(4.5).ph(6.5),
        ]);
        let results = r.recommend("BE1").unwrap();
        assert_eq!(results.len(), 1);

        let milk = &results[0];
        assert!(milk.pairing_suggestions.iter().any(|s| s.contains("luxury gift assortment")));
        assert!(milk.pairing_suggestions.iter().any(|s| s.contains("dark and milk")));
        assert_eq!(milk.compatibility_breakdown[&CompatibilityComponent::BaseTypeComplementarity], 0.9);
        assert_eq!(milk.compatibility_breakdown[&CompatibilityComponent::RegionAvailability], 1.0);
    }

    #[test]
    fn test_ranking_threshold_and_clamp() {
        let r = recommender(vec![
            product("BE1", "Dark", "Standard", "Callets"),
            product("BE2", "Milk", "Standard", "Callets"),
            product("US3", "White", "Standard", "Callets"),
            product("BE4", "Ruby", "Sugar-Free", "Callets"),
            product("BE5", "Milk", "Standard", "Drops"),
            product("BE6", "White", "Standard", "Drops"),
            product("BE7", "Milk", "Premium", "Drops"),
            product("BE8", "Dark", "Standard", "Drops"),
        ]);

        let results = r.recommend_top("BE1", 10).unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.windows(2).all(|w| w[0].compatibility_score >= w[1].compatibility_score));
        // Equal scores keep catalog order
        assert_eq!(results[0].material_code, "BE2");
        assert_eq!(results[1].material_code, "BE5");

        assert_eq!(r.recommend_top("BE1", 1).unwrap().len(), 3);
        assert_eq!(r.recommend("BE1").unwrap().len(), 3);
    }

    #[test]
    fn test_known_code_without_compatible_products_is_empty() {
        let r = recommender(vec![
            product("BE1", "Dark", "Premium", "Callets").viscosity(2.0).ph(5.0),
            product("US2", "Dark", "Sugar-Free", "Drops").viscosity(8.0).ph(7.0),
            product("US3", "Dark", "Sugar-Free", "Block").viscosity(8.0).ph(7.0),
        ]);
        let catalog = r.catalog.clone();
        let anchor = catalog.product("BE1").unwrap();
        for code in ["US2", "US3"] {
            let (score, _) = r.compatibility(anchor, catalog.product(code).unwrap());
            assert!(score <= 0.4, "{code} scored {score}");
        }

        let results = r.recommend("BE1").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_technical_compatibility_neutral_without_values() {
        let r = recommender(vec![
            product("BE1", "Dark", "Standard", "Callets"),
            product("BE2", "Milk", "Standard", "Callets"),
        ]);
        let catalog = r.catalog.clone();
        let (_, breakdown) = r.compatibility(catalog.product("BE1").unwrap(), catalog.product("BE2").unwrap());
        assert_eq!(breakdown[&CompatibilityComponent::TechnicalCompatibility], 0.5);
    }
}
