//! Progress reporting hooks
//!
//! Searches call a [`ProgressSink`] synchronously at each stage boundary.
//! Sinks must not block for long; they run on the searching thread.

use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStep {
    StrictSearch,
    RelaxedSearch,
    Merge,
    /// Similarity re-ranking of the merged list
    Rank,
    CrossSell,
}

impl SearchStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStep::StrictSearch => "strict_search",
            SearchStep::RelaxedSearch => "relaxed_search",
            SearchStep::Merge => "merge",
            SearchStep::Rank => "rank",
            SearchStep::CrossSell => "cross_sell",
        }
    }
}

impl fmt::Display for SearchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait ProgressSink: Send + Sync {
    fn on_step_started(&self, step: SearchStep);

    /// `results` is the number of products the step produced
    fn on_step_completed(&self, step: SearchStep, results: usize);

    fn on_step_failed(&self, step: SearchStep, reason: &str);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_step_started(&self, _step: SearchStep) {}

    fn on_step_completed(&self, _step: SearchStep, _results: usize) {}

    fn on_step_failed(&self, _step: SearchStep, _reason: &str) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_step_started(&self, step: SearchStep) {
        info!(%step, "step started");
    }

    fn on_step_completed(&self, step: SearchStep, results: usize) {
        info!(%step, results, "step completed");
    }

    fn on_step_failed(&self, step: SearchStep, reason: &str) {
        warn!(%step, reason, "step failed");
    }
}
