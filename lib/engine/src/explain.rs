//! Explainable result payloads
//!
//! Every result carries the per-attribute sub-scores that produced it, and
//! relaxed results carry the exact constraint deviations that admitted them.

use cacao_catalog::{ProductDetails, ProductView, TechnicalAttribute};
use cacao_similarity::{CompatibilityComponent, MatchAttribute};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Unweighted [0, 1] sub-score per scored attribute
pub type ScoreBreakdown = BTreeMap<MatchAttribute, f64>;

pub type CompatibilityBreakdown = BTreeMap<CompatibilityComponent, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Strict,
    Relaxed,
}

/// A constraint Phase 2 loosened
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelaxedAttribute {
    DeliveryFormat,
    ProteinContent,
    Technical(TechnicalAttribute),
    Region,
}

impl RelaxedAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelaxedAttribute::DeliveryFormat => "delivery_format",
            RelaxedAttribute::ProteinContent => "protein_content",
            RelaxedAttribute::Technical(attribute) => attribute.as_str(),
            RelaxedAttribute::Region => "region",
        }
    }
}

impl Serialize for RelaxedAttribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelaxedValue {
    Number(f64),
    Text(String),
}

impl RelaxedValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RelaxedValue::Number(v) => Some(*v),
            RelaxedValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RelaxedValue::Number(_) => None,
            RelaxedValue::Text(s) => Some(s),
        }
    }
}

/// How far a relaxed result is from the original requirement on one
/// attribute. `delta_pct` is set for numeric attributes only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelaxationDetail {
    pub attribute: RelaxedAttribute,
    pub original: RelaxedValue,
    pub accepted: RelaxedValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_pct: Option<f64>,
}

impl RelaxationDetail {
    pub fn categorical(attribute: RelaxedAttribute, original: &str, accepted: &str) -> Self {
        Self {
            attribute,
            original: RelaxedValue::Text(original.to_string()),
            accepted: RelaxedValue::Text(accepted.to_string()),
            delta_pct: None,
        }
    }

    pub fn numeric(attribute: RelaxedAttribute, original: f64, accepted: f64, delta_pct: f64) -> Self {
        Self {
            attribute,
            original: RelaxedValue::Number(original),
            accepted: RelaxedValue::Number(accepted),
            delta_pct: Some(delta_pct),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub material_code: String,
    pub description: String,
    pub match_score: f64,
    pub score_breakdown: ScoreBreakdown,
    pub details: ProductDetails,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relaxation_details: Vec<RelaxationDetail>,
    pub search_phase: SearchPhase,
    pub is_exact_match: bool,
}

impl MatchResult {
    pub fn new(
        view: &ProductView<'_>,
        match_score: f64,
        score_breakdown: ScoreBreakdown,
        search_phase: SearchPhase,
        exact_threshold: f64,
    ) -> Self {
        Self {
            material_code: view.product.material_code.clone(),
            description: view.product.description.clone(),
            match_score,
            score_breakdown,
            details: view.details(),
            relaxation_details: Vec::new(),
            search_phase,
            is_exact_match: match_score >= exact_threshold,
        }
    }

    pub fn with_relaxation(mut self, details: Vec<RelaxationDetail>) -> Self {
        self.relaxation_details = details;
        self
    }

    pub fn relaxation(&self, attribute: RelaxedAttribute) -> Option<&RelaxationDetail> {
        self.relaxation_details.iter().find(|d| d.attribute == attribute)
    }
}

/// Which filter a count was taken after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStepKind {
    MarketSegment,
    ProductType,
    BaseType,
    DeliveryFormat,
    TechnicalSpecs,
    Protein,
    Region,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterStep {
    pub step: FilterStepKind,
    pub remaining: usize,
}

/// Candidate counts through one filter pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub initial_count: usize,
    pub steps: Vec<FilterStep>,
    pub final_count: usize,
}

impl SearchStats {
    /// Count remaining after `step`, if that step ran
    pub fn after(&self, step: FilterStepKind) -> Option<usize> {
        self.steps.iter().find(|s| s.step == step).map(|s| s.remaining)
    }
}

/// Aggregate view of a ranked result list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSummary {
    pub results_count: usize,
    pub avg_score: f64,
    pub best_score: f64,
    /// Attribute with the highest weighted contribution to the best result
    pub top_contributing_attribute: Option<MatchAttribute>,
}

impl ResultSummary {
    /// `results` must already be ranked
    pub fn compute(results: &[MatchResult], weights: &cacao_similarity::MatchWeights) -> Self {
        let Some(best) = results.first() else {
            return Self::default();
        };

        let avg_score = results.iter().map(|r| r.match_score).sum::<f64>() / results.len() as f64;
        let top_contributing_attribute = best
            .score_breakdown
            .iter()
            .map(|(attribute, score)| (*attribute, score * weights.weight(*attribute)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(attribute, _)| attribute);

        Self {
            results_count: results.len(),
            avg_score,
            best_score: best.match_score,
            top_contributing_attribute,
        }
    }
}

/// Outcome of a search. `NoMatches` is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SearchStatus {
    Matched,
    NoMatches,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    #[serde(flatten)]
    pub status: SearchStatus,
    pub matches: Vec<MatchResult>,
    pub summary: ResultSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_stats: Option<SearchStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relaxed_stats: Option<SearchStats>,
}

impl SearchReport {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: SearchStatus::Failed(reason.into()),
            matches: Vec::new(),
            summary: ResultSummary::default(),
            strict_stats: None,
            relaxed_stats: None,
        }
    }

    /// Whether Phase 2 ran
    pub fn relaxed(&self) -> bool {
        self.relaxed_stats.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossSellResult {
    pub material_code: String,
    pub description: String,
    pub compatibility_score: f64,
    pub compatibility_breakdown: CompatibilityBreakdown,
    pub pairing_suggestions: Vec<String>,
    pub details: ProductDetails,
}
