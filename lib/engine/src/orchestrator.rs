//! Search orchestration
//!
//! Runs Phase 1, falls back to Phase 2 when too few strict matches were
//! found, merges both result sets by material code and truncates to the
//! requested size.

use crate::config::{EngineConfig, SearchConfig};
use crate::error::Result;
use crate::explain::{MatchResult, ResultSummary, SearchReport, SearchStatus};
use crate::progress::{NoopProgress, ProgressSink, SearchStep};
use crate::relaxed::RelaxedSearch;
use crate::requirement::{RawRequirementProfile, RequirementProfile};
use crate::scorer::{MatchScorer, ScoringPolicy};
use crate::strict::StrictSearch;
use cacao_catalog::Catalog;
use cacao_similarity::{MatchWeights, ScoreMode};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

/// Per-call search settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Defaults to the configured `top_n` (or `similarity_top_n` in
    /// similarity mode)
    pub top_n: Option<usize>,
    /// Final ranking only; both phases always filter and score in
    /// requirement mode
    pub mode: ScoreMode,
    /// Overrides the configured Phase-2 trigger
    pub min_strict_matches: Option<usize>,
}

impl SearchOptions {
    pub fn similarity() -> Self {
        Self { mode: ScoreMode::Similarity, ..Default::default() }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }
}

/// Entry point for product matching.
///
/// Holds the shared catalog and the scoring configuration; every call is
/// independent, so one engine can serve concurrent searches.
pub struct SearchEngine {
    catalog: Arc<Catalog>,
    weights: MatchWeights,
    config: SearchConfig,
    progress: Arc<dyn ProgressSink>,
}

impl SearchEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            weights: MatchWeights::default(),
            config: SearchConfig::default(),
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn with_config(catalog: Arc<Catalog>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            weights: config.weights,
            config: config.search.clone(),
            progress: Arc::new(NoopProgress),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Ranked matches with default options
    pub fn find_matching_products(&self, requirement: &RequirementProfile) -> Vec<MatchResult> {
        self.search(requirement, &SearchOptions::default()).matches
    }

    pub fn search(&self, requirement: &RequirementProfile, options: &SearchOptions) -> SearchReport {
        let top_n = options.top_n.unwrap_or(match options.mode {
            ScoreMode::Requirement => self.config.top_n,
            ScoreMode::Similarity => self.config.similarity_top_n,
        });
        let min_strict = options.min_strict_matches.unwrap_or(self.config.min_strict_matches);

        self.progress.on_step_started(SearchStep::StrictSearch);
        let strict = StrictSearch::new(&self.catalog, self.weights, self.config.clone());
        let (strict_results, strict_stats) = strict.search(requirement);
        self.progress.on_step_completed(SearchStep::StrictSearch, strict_results.len());

        let (mut matches, relaxed_stats) = if strict_results.len() >= min_strict {
            (strict_results, None)
        } else {
            debug!(strict = strict_results.len(), min_strict, "too few strict matches, relaxing");
            self.progress.on_step_started(SearchStep::RelaxedSearch);
            let relaxed = RelaxedSearch::new(&self.catalog, self.weights, self.config.clone());
            let (relaxed_results, relaxed_stats) = relaxed.search(requirement);
            self.progress.on_step_completed(SearchStep::RelaxedSearch, relaxed_results.len());

            self.progress.on_step_started(SearchStep::Merge);
            let merged = merge(strict_results, relaxed_results);
            self.progress.on_step_completed(SearchStep::Merge, merged.len());
            (merged, Some(relaxed_stats))
        };

        if options.mode == ScoreMode::Similarity {
            self.progress.on_step_started(SearchStep::Rank);
            matches = self.similarity_rank(matches, requirement);
            self.progress.on_step_completed(SearchStep::Rank, matches.len());
        }

        matches.truncate(top_n);
        let status = if matches.is_empty() { SearchStatus::NoMatches } else { SearchStatus::Matched };
        debug!(matches = matches.len(), ?status, "search finished");

        SearchReport {
            status,
            summary: ResultSummary::compute(&matches, &self.weights),
            matches,
            strict_stats: Some(strict_stats),
            relaxed_stats,
        }
    }

    /// Re-score the merged list with neutral credit for unrequested
    /// attributes and catalog-range distances, then re-sort (stable)
    fn similarity_rank(&self, matches: Vec<MatchResult>, requirement: &RequirementProfile) -> Vec<MatchResult> {
        let scorer = MatchScorer::new(&self.catalog, self.weights)
            .with_alternative_format_score(self.config.alternative_format_score);
        let policy = ScoringPolicy::similarity();

        let mut ranked: Vec<MatchResult> = matches
            .into_iter()
            .map(|mut result| {
                if let Some(view) = self.catalog.view_of(&result.material_code) {
                    let (score, breakdown) = scorer.score(&view, requirement, policy);
                    result.match_score = score;
                    result.score_breakdown = breakdown;
                    result.is_exact_match = score >= self.config.exact_match_threshold;
                }
                result
            })
            .collect();
        ranked.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        ranked
    }

    /// Search from an unvalidated JSON requirement.
    ///
    /// A payload that is not a JSON object yields `SearchStatus::Failed`
    /// with no matches; it never panics or returns an error.
    pub fn search_json(&self, json: &str, options: &SearchOptions) -> SearchReport {
        match serde_json::from_str::<RawRequirementProfile>(json) {
            Ok(raw) => self.search(&raw.validate(), options),
            Err(e) => {
                let reason = format!("requirement is not valid JSON: {}", e);
                error!(%reason, "search failed");
                self.progress.on_step_failed(SearchStep::StrictSearch, &reason);
                SearchReport::failed(reason)
            }
        }
    }
}

/// Strict records win on duplicate codes; stable ranking keeps strict
/// entries first among equal scores
fn merge(strict: Vec<MatchResult>, relaxed: Vec<MatchResult>) -> Vec<MatchResult> {
    let seen: HashSet<String> = strict.iter().map(|r| r.material_code.clone()).collect();
    let mut merged = strict;
    merged.extend(relaxed.into_iter().filter(|r| !seen.contains(&r.material_code)));
    merged.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
    merged
}
