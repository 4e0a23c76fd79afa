//! Scoring schema
//!
//! Declares which attributes take part in a match score, how much each one
//! weighs and how numeric distances are normalized. Weights are relative:
//! a score is always renormalized over the attributes that were actually
//! scored, so leaving an attribute out of a requirement never deflates the
//! result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attributes that contribute to a match score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAttribute {
    BaseType,
    ProductType,
    DeliveryFormat,
    TechnicalSpecs,
    Protein,
    Region,
}

impl MatchAttribute {
    pub const ALL: [MatchAttribute; 6] = [
        MatchAttribute::BaseType,
        MatchAttribute::ProductType,
        MatchAttribute::DeliveryFormat,
        MatchAttribute::TechnicalSpecs,
        MatchAttribute::Protein,
        MatchAttribute::Region,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchAttribute::BaseType => "base_type",
            MatchAttribute::ProductType => "product_type",
            MatchAttribute::DeliveryFormat => "delivery_format",
            MatchAttribute::TechnicalSpecs => "technical_specs",
            MatchAttribute::Protein => "protein",
            MatchAttribute::Region => "region",
        }
    }
}

impl fmt::Display for MatchAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative weights of the match attributes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchWeights {
    pub base_type: f64,
    pub product_type: f64,
    pub delivery_format: f64,
    pub technical_specs: f64,
    pub protein: f64,
    pub region: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            base_type: 0.30,
            product_type: 0.20,
            delivery_format: 0.20,
            technical_specs: 0.30,
            protein: 0.20,
            region: 0.20,
        }
    }
}

impl MatchWeights {
    pub fn weight(&self, attribute: MatchAttribute) -> f64 {
        match attribute {
            MatchAttribute::BaseType => self.base_type,
            MatchAttribute::ProductType => self.product_type,
            MatchAttribute::DeliveryFormat => self.delivery_format,
            MatchAttribute::TechnicalSpecs => self.technical_specs,
            MatchAttribute::Protein => self.protein,
            MatchAttribute::Region => self.region,
        }
    }

    /// Reject negative weights and an all-zero table
    pub fn validate(&self) -> Result<(), WeightError> {
        validate_weights(MatchAttribute::ALL.iter().map(|a| (a.as_str(), self.weight(*a))))
    }

    /// Weighted mean over the attributes that were scored
    ///
    /// Returns 0.0 when nothing was scored or every scored attribute has
    /// zero weight.
    pub fn combine(&self, scores: &[(MatchAttribute, f64)]) -> f64 {
        weighted_mean(scores.iter().map(|(a, s)| (self.weight(*a), *s)))
    }
}

/// Components of a cross-sell compatibility score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityComponent {
    BaseTypeComplementarity,
    ProductTypeMatch,
    TechnicalCompatibility,
    RegionAvailability,
}

impl CompatibilityComponent {
    pub const ALL: [CompatibilityComponent; 4] = [
        CompatibilityComponent::BaseTypeComplementarity,
        CompatibilityComponent::ProductTypeMatch,
        CompatibilityComponent::TechnicalCompatibility,
        CompatibilityComponent::RegionAvailability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityComponent::BaseTypeComplementarity => "base_type_complementarity",
            CompatibilityComponent::ProductTypeMatch => "product_type_match",
            CompatibilityComponent::TechnicalCompatibility => "technical_compatibility",
            CompatibilityComponent::RegionAvailability => "region_availability",
        }
    }
}

/// Weights of the cross-sell compatibility components
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompatibilityWeights {
    pub base_type_complementarity: f64,
    pub product_type_match: f64,
    pub technical_compatibility: f64,
    pub region_availability: f64,
}

impl Default for CompatibilityWeights {
    fn default() -> Self {
        Self {
            base_type_complementarity: 0.35,
            product_type_match: 0.25,
            technical_compatibility: 0.25,
            region_availability: 0.15,
        }
    }
}

impl CompatibilityWeights {
    pub fn weight(&self, component: CompatibilityComponent) -> f64 {
        match component {
            CompatibilityComponent::BaseTypeComplementarity => self.base_type_complementarity,
            CompatibilityComponent::ProductTypeMatch => self.product_type_match,
            CompatibilityComponent::TechnicalCompatibility => self.technical_compatibility,
            CompatibilityComponent::RegionAvailability => self.region_availability,
        }
    }

    pub fn validate(&self) -> Result<(), WeightError> {
        validate_weights(CompatibilityComponent::ALL.iter().map(|c| (c.as_str(), self.weight(*c))))
    }

    pub fn combine(&self, scores: &[(CompatibilityComponent, f64)]) -> f64 {
        weighted_mean(scores.iter().map(|(c, s)| (self.weight(*c), *s)))
    }
}

/// How a numeric distance is normalized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// A fixed fraction of the requirement's target value
    TargetFraction(f64),
    /// The catalog-wide observed range of the attribute
    CatalogRange,
}

/// Whether unrequested attributes take part in a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    /// Only requested attributes are scored, tolerances follow the search phase
    #[default]
    Requirement,
    /// Every attribute is scored; unrequested ones count as a neutral 0.5 and
    /// numeric distances use catalog ranges
    Similarity,
}

/// Neutral sub-score used for unrequested attributes in similarity mode
pub const NEUTRAL_SCORE: f64 = 0.5;

fn validate_weights<'a>(weights: impl Iterator<Item = (&'a str, f64)>) -> Result<(), WeightError> {
    let mut total = 0.0;
    for (name, weight) in weights {
        if !weight.is_finite() || weight < 0.0 {
            return Err(WeightError::NegativeWeight(name.to_string()));
        }
        total += weight;
    }
    if total <= 0.0 {
        return Err(WeightError::ZeroTotalWeight);
    }
    Ok(())
}

fn weighted_mean(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let (sum, total) = pairs.fold((0.0, 0.0), |(sum, total), (w, s)| (sum + w * s, total + w));
    if total > 0.0 {
        crate::distance::clamp_unit(sum / total)
    } else {
        0.0
    }
}

/// Errors in a configured weight table
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    #[error("Weight '{0}' must be a non-negative number")]
    NegativeWeight(String),

    #[error("Total weight cannot be zero")]
    ZeroTotalWeight,

    #[error("Tolerance fraction {0} must be positive")]
    InvalidTolerance(f64),
}

/// A single attribute could not be scored or filtered.
///
/// Never fatal: the attribute's contribution is skipped and the rest of the
/// search goes on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttributeError {
    #[error("{attribute} has no value for {material_code}")]
    MissingValue { attribute: String, material_code: String },

    #[error("{attribute} value '{raw}' is not numeric")]
    NonNumeric { attribute: String, raw: String },

    #[error("Unknown attribute '{0}'")]
    UnknownAttribute(String),

    #[error("No catalog range observed for {0}")]
    NoRange(String),
}
