use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::posting::{JobPosting, SourceTag};
use crate::models::scored::{FitLevel, ScoredJobPosting};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Failed,
    TimedOut,
}

/// Outcome of the single fallback attempt made for a primary source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackReport {
    pub source: SourceTag,
    pub status: FetchStatus,
    pub normalized: usize,
    pub dropped: usize,
    pub error: Option<String>,
}

/// Per-source fetch diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: SourceTag,
    pub status: FetchStatus,
    pub raw_records: usize,
    pub normalized: usize,
    pub dropped: usize,
    pub error: Option<String>,
    pub fallback: Option<FallbackReport>,
    pub search_criteria: Option<Value>,
}

impl SourceReport {
    /// Postings this source contributed, fallback included.
    pub fn usable(&self) -> usize {
        self.normalized + self.fallback.as_ref().map(|f| f.normalized).unwrap_or(0)
    }
}

/// Count of unique scored postings per fit level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitSummary {
    pub strong: usize,
    pub medium: usize,
    pub weak: usize,
    pub aspirational: usize,
}

impl FitSummary {
    pub fn from_scored<'a>(scored: impl IntoIterator<Item = &'a ScoredJobPosting>) -> Self {
        let mut summary = FitSummary::default();
        for s in scored {
            match s.fit_level {
                FitLevel::Strong => summary.strong += 1,
                FitLevel::Medium => summary.medium += 1,
                FitLevel::Weak => summary.weak += 1,
                FitLevel::Aspirational => summary.aspirational += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.strong + self.medium + self.weak + self.aspirational
    }
}

/// Terminal output of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub best_matches: Vec<ScoredJobPosting>,
    /// Unique postings per source, after dedup.
    pub source_breakdown: BTreeMap<SourceTag, usize>,
    /// Normalized postings per source, before dedup.
    pub per_source_raw: BTreeMap<SourceTag, Vec<JobPosting>>,
    pub unique_postings: usize,
    pub fit_summary: FitSummary,
    pub source_reports: Vec<SourceReport>,
}

/// What `aggregate` hands back. An empty run is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AggregationOutcome {
    Results(AggregationResult),
    NoResults { source_reports: Vec<SourceReport> },
}

impl AggregationOutcome {
    pub fn result(&self) -> Option<&AggregationResult> {
        match self {
            AggregationOutcome::Results(result) => Some(result),
            AggregationOutcome::NoResults { .. } => None,
        }
    }

    pub fn into_result(self) -> Option<AggregationResult> {
        match self {
            AggregationOutcome::Results(result) => Some(result),
            AggregationOutcome::NoResults { .. } => None,
        }
    }

    pub fn source_reports(&self) -> &[SourceReport] {
        match self {
            AggregationOutcome::Results(result) => &result.source_reports,
            AggregationOutcome::NoResults { source_reports } => source_reports,
        }
    }
}
