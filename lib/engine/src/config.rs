//! Engine configuration
//!
//! Every field has a default, so an empty file (or no file) yields the
//! stock engine. Loaded from TOML:
//!
//! ```toml
//! [search]
//! min_strict_matches = 3
//! top_n = 5
//!
//! [weights]
//! technical_specs = 0.4
//!
//! [cross_sell]
//! top_n = 4
//! ```

use crate::error::{EngineError, Result};
use cacao_similarity::{CompatibilityWeights, MatchWeights, WeightError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub weights: MatchWeights,
    pub cross_sell: CrossSellConfig,
}

/// Knobs of the two-phase search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Phase 2 runs when Phase 1 finds fewer than this many products
    pub min_strict_matches: usize,
    pub top_n: usize,
    /// Result count for similarity-mode searches
    pub similarity_top_n: usize,
    /// Phase-1 technical window and scoring tolerance, as a fraction of target
    pub strict_tolerance: f64,
    /// Phase-2 scoring tolerance, as a fraction of target
    pub relaxed_tolerance: f64,
    /// Phase-2 protein minimum is the requested minimum times this factor
    pub protein_relaxation: f64,
    /// Phase-2 technical window is target ± this fraction
    pub technical_relaxation: f64,
    pub relax_region: bool,
    /// Credit for a delivery format adjacent to the requested one
    pub alternative_format_score: f64,
    /// Scores at or above this are flagged as exact matches
    pub exact_match_threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_strict_matches: 3,
            top_n: 5,
            similarity_top_n: 10,
            strict_tolerance: 0.05,
            relaxed_tolerance: 0.20,
            protein_relaxation: 0.8,
            technical_relaxation: 0.2,
            relax_region: true,
            alternative_format_score: 0.7,
            exact_match_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossSellConfig {
    /// Clamped to 3..=5 at use
    pub top_n: usize,
    /// Candidates must score strictly above this
    pub min_score: f64,
    pub weights: CompatibilityWeights,
}

impl Default for CrossSellConfig {
    fn default() -> Self {
        Self { top_n: 3, min_score: 0.4, weights: CompatibilityWeights::default() }
    }
}

impl EngineConfig {
    /// Read and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.cross_sell.weights.validate()?;
        self.search.validate()?;

        if !(0.0..=1.0).contains(&self.cross_sell.min_score) {
            return Err(EngineError::Config("cross_sell.min_score must be within [0, 1]".into()));
        }
        Ok(())
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        for tolerance in [self.strict_tolerance, self.relaxed_tolerance, self.technical_relaxation] {
            if !tolerance.is_finite() || tolerance <= 0.0 {
                return Err(WeightError::InvalidTolerance(tolerance).into());
            }
        }
        if !(0.0..=1.0).contains(&self.protein_relaxation) {
            return Err(EngineError::Config("search.protein_relaxation must be within [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.alternative_format_score) {
            return Err(EngineError::Config(
                "search.alternative_format_score must be within [0, 1]".into(),
            ));
        }
        if self.top_n == 0 || self.similarity_top_n == 0 {
            return Err(EngineError::Config("search.top_n must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.search.top_n, 5);
        assert_eq!(config.cross_sell.weights.base_type_complementarity, 0.35);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [search]
            top_n = 8
            relax_region = false

            [weights]
            region = 0.0

            [cross_sell.weights]
            region_availability = 0.3
            "#,
        )
        .unwrap();

        assert_eq!(config.search.top_n, 8);
        assert!(!config.search.relax_region);
        assert_eq!(config.search.min_strict_matches, 3);
        assert_eq!(config.weights.region, 0.0);
        assert_eq!(config.weights.base_type, 0.30);
        assert_eq!(config.cross_sell.weights.region_availability, 0.3);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("[weights]\nbase_type = -1.0"),
            Err(EngineError::Weights(WeightError::NegativeWeight(_)))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[search]\nstrict_tolerance = 0.0"),
            Err(EngineError::Weights(WeightError::InvalidTolerance(_)))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[search]\ntop_n = \"five\""),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[cross_sell]\ntop_n = 4\nmin_score = 0.5").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.cross_sell.top_n, 4);
        assert_eq!(config.cross_sell.min_score, 0.5);

        assert!(EngineConfig::load(Path::new("/nonexistent/cacao.toml")).is_err());
    }
}
