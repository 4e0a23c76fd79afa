//! Ordered filter pipeline
//!
//! Both search phases reduce the catalog through the same sequence of
//! AND-combined steps; they differ only in the bounds each step uses.
//! Candidate order always follows catalog row order.

use crate::explain::{FilterStep, FilterStepKind, SearchStats};
use crate::requirement::RequirementProfile;
use cacao_catalog::{Catalog, Filter, FilterCondition, ProductField, ProductView, TechnicalAttribute};
use cacao_similarity::segment_applications;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    steps: Vec<(FilterStepKind, FilterCondition)>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: FilterStepKind, condition: FilterCondition) {
        self.steps.push((kind, condition));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = FilterStepKind> + '_ {
        self.steps.iter().map(|(kind, _)| *kind)
    }

    /// Apply every step in order, stopping early once nothing is left
    pub fn run<'c>(&self, catalog: &'c Catalog) -> (Vec<ProductView<'c>>, SearchStats) {
        let mut candidates: Vec<ProductView<'c>> = catalog.views().collect();
        let mut stats = SearchStats { initial_count: candidates.len(), ..Default::default() };

        for (kind, condition) in &self.steps {
            if candidates.is_empty() {
                break;
            }
            candidates.retain(|view| condition.matches(view));
            debug!(step = ?kind, remaining = candidates.len(), "filter applied");
            stats.steps.push(FilterStep { step: *kind, remaining: candidates.len() });
        }

        stats.final_count = candidates.len();
        (candidates, stats)
    }
}

/// Category predicate for the requested market segment or application.
///
/// An application narrows to that category. A known segment admits any of
/// its applications (or a category naming the segment itself); an unknown
/// segment falls back to a category substring match.
pub fn segment_condition(requirement: &RequirementProfile) -> Option<FilterCondition> {
    if let Some(application) = requirement.application.as_deref() {
        return Some(FilterCondition::contains(ProductField::Category, application));
    }
    let segment = requirement.market_segment.as_deref()?;
    let by_name = FilterCondition::contains(ProductField::Category, segment);
    Some(match segment_applications(segment) {
        Some((_, applications)) => FilterCondition::Or(vec![
            FilterCondition::one_of(ProductField::Category, applications.iter()),
            by_name,
        ]),
        None => by_name,
    })
}

/// Inclusive numeric window regardless of the target's sign
pub fn technical_window(attribute: TechnicalAttribute, low: f64, high: f64) -> FilterCondition {
    FilterCondition::Between {
        field: ProductField::Technical(attribute),
        min: low.min(high),
        max: low.max(high),
    }
}

/// Every requested technical target within `target · (1 ± fraction)`
pub fn technical_condition(requirement: &RequirementProfile, fraction: f64) -> Option<FilterCondition> {
    if requirement.technical_specs.is_empty() {
        return None;
    }
    Some(FilterCondition::And(
        requirement
            .technical_specs
            .iter()
            .map(|(attribute, target)| {
                technical_window(*attribute, target * (1.0 - fraction), target * (1.0 + fraction))
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog, ProductSpec};

    #[test]
    fn test_steps_run_in_order_and_short_circuit() {
        let catalog = catalog(vec![
            ProductSpec::new("BE1", "Dark", "Drops"),
            ProductSpec::new("BE2", "Milk", "Drops"),
            ProductSpec::new("BE3", "Dark", "Block"),
        ]);

        let mut pipeline = FilterPipeline::new();
        pipeline.push(FilterStepKind::BaseType, FilterCondition::contains(ProductField::BaseType, "dark"));
        pipeline.push(FilterStepKind::DeliveryFormat, FilterCondition::contains(ProductField::MouldingType, "drops"));
        let (survivors, stats) = pipeline.run(&catalog);

        assert_eq!(survivors.iter().map(|v| v.material_code()).collect::<Vec<_>>(), vec!["BE1"]);
        assert_eq!(stats.initial_count, 3);
        assert_eq!(stats.after(FilterStepKind::BaseType), Some(2));
        assert_eq!(stats.final_count, 1);

        let mut empty_early = FilterPipeline::new();
        empty_early.push(FilterStepKind::BaseType, FilterCondition::contains(ProductField::BaseType, "ruby"));
        empty_early.push(FilterStepKind::DeliveryFormat, FilterCondition::contains(ProductField::MouldingType, "drops"));
        let (survivors, stats) = empty_early.run(&catalog);
        assert!(survivors.is_empty());
        assert_eq!(stats.steps.len(), 1);
    }

    #[test]
    fn test_segment_condition() {
        let catalog = catalog(vec![
            ProductSpec::new("BE1", "Dark", "Drops").category("Pralines"),
            ProductSpec::new("BE2", "Dark", "Drops").category("Butter cakes"),
            ProductSpec::new("BE3", "Dark", "Drops").category("Bakery fillings"),
        ]);
        let matching = |req: &RequirementProfile| -> Vec<String> {
            let condition = segment_condition(req).unwrap();
            catalog
                .views()
                .filter(|v| condition.matches(v))
                .map(|v| v.material_code().to_string())
                .collect()
        };

        assert_eq!(matching(&RequirementProfile::new().with_market_segment("bakery")), vec!["BE2", "BE3"]);
        assert_eq!(matching(&RequirementProfile::new().with_market_segment("Confectionery")), vec!["BE1"]);
        assert_eq!(
            matching(&RequirementProfile::new().with_market_segment("Bakery").with_application("Pralines")),
            vec!["BE1"]
        );
        assert!(segment_condition(&RequirementProfile::new()).is_none());
    }

    #[test]
    fn test_technical_condition_band() {
        let catalog = catalog(vec![
            ProductSpec::new("BE1", "Dark", "Drops").viscosity(41.9),
            ProductSpec::new("BE2", "Dark", "Drops").viscosity(42.1),
            ProductSpec::new("BE3", "Dark", "Drops"),
        ]);
        let req = RequirementProfile::new().with_technical(TechnicalAttribute::Viscosity, 40.0);
        let condition = technical_condition(&req, 0.05).unwrap();
        let codes: Vec<_> = catalog.views().filter(|v| condition.matches(v)).map(|v| v.material_code()).collect();
        assert_eq!(codes, vec!["BE1"]);

        let negative = technical_window(TechnicalAttribute::Ph, -4.0 * 1.05, -4.0 * 0.95);
        assert!(matches!(negative, FilterCondition::Between { min, max, .. } if min < max));
    }
}
