//! Fit Scoring: pluggable, trait-based scorer that measures a candidate profile
//! against one normalized posting.
//!
//! Default: `WeightedFitScorer` (five dimension scores, weighted sum, fixed
//! thresholds). The orchestrator holds an `Arc<dyn FitScorer>`.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::config::{AggregationConfig, FitThresholds, GapThresholds, ScoringWeights};
use crate::models::scored::{
    DimensionScores, ExperienceScore, RoleScore, SalaryReason, SalaryScore, MAX_DIMENSION_SCORE,
};
use crate::models::{CandidateProfile, Dimension, FitLevel, JobPosting, KeyGap, ScoredJobPosting};
use crate::scoring::dimensions::{
    round_to, score_experience, score_location, score_role, score_salary, score_skills,
};
use crate::scoring::similarity::{LevenshteinSimilarity, SimilarityMetric};

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The fit scorer trait. Implement this to swap backends without touching
/// the orchestrator or the ranker.
///
/// Scoring is pure: same profile and posting, same result.
pub trait FitScorer: Send + Sync {
    fn score(&self, profile: &CandidateProfile, posting: &JobPosting) -> ScoredJobPosting;

    /// Short label for logs ("weighted", ...).
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedFitScorer: default implementation
// ────────────────────────────────────────────────────────────────────────────

/// Five-dimension weighted scorer.
///
/// 1. role, skills, experience, location, salary each scored in `[0, 3]`
/// 2. overall = Σ(score × weight) / 3 × 100, clamped to `[0, 100]`
/// 3. fit level from the overall score, key gaps from per-dimension cut-offs
pub struct WeightedFitScorer {
    weights: ScoringWeights,
    fit_thresholds: FitThresholds,
    gap_thresholds: GapThresholds,
    matched_threshold: f64,
    metric: Arc<dyn SimilarityMetric>,
}

impl WeightedFitScorer {
    pub fn new(config: &AggregationConfig) -> Self {
        Self::with_metric(config, Arc::new(LevenshteinSimilarity))
    }

    pub fn with_metric(config: &AggregationConfig, metric: Arc<dyn SimilarityMetric>) -> Self {
        Self {
            weights: config.weights.clone(),
            fit_thresholds: config.fit_thresholds.clone(),
            gap_thresholds: config.gap_thresholds.clone(),
            matched_threshold: config.matched_threshold,
            metric,
        }
    }

    fn dimensions(&self, profile: &CandidateProfile, posting: &JobPosting) -> DimensionScores {
        let role = score_role(self.metric.as_ref(), &profile.preferred_role, &posting.title)
            .unwrap_or_else(|e| {
                warn!(title = %posting.title, "role scoring failed: {e}");
                RoleScore {
                    score: 0.0,
                    similarity: 0.0,
                }
            });

        let skills = score_skills(&profile.top_skills, posting);

        let experience = score_experience(
            profile.years_experience,
            posting.experience_required.as_deref(),
        )
        .unwrap_or_else(|e| {
            warn!(title = %posting.title, "experience scoring failed: {e}");
            ExperienceScore {
                score: 0.0,
                required_years: None,
            }
        });

        let location = score_location(&profile.locations, profile.remote_preference, posting);

        let salary = score_salary(profile.target_salary, posting.salary_min, posting.salary_max)
            .unwrap_or_else(|e| {
                warn!(title = %posting.title, "salary scoring failed: {e}");
                SalaryScore {
                    score: 0.0,
                    reason: SalaryReason::Error,
                }
            });

        DimensionScores {
            role,
            skills,
            experience,
            location,
            salary,
        }
    }

    fn overall(&self, dims: &DimensionScores) -> f64 {
        let weighted: f64 = dims
            .iter()
            .zip(self.weights.as_array())
            .map(|((_, score), weight)| score * weight)
            .sum();
        round_to((weighted / MAX_DIMENSION_SCORE * 100.0).clamp(0.0, 100.0), 2)
    }

    fn fit_level(&self, overall: f64) -> FitLevel {
        let t = &self.fit_thresholds;
        if overall >= t.strong {
            FitLevel::Strong
        } else if overall >= t.medium {
            FitLevel::Medium
        } else if overall >= t.weak {
            FitLevel::Weak
        } else {
            FitLevel::Aspirational
        }
    }

    fn key_gaps(&self, dims: &DimensionScores) -> BTreeSet<KeyGap> {
        let g = &self.gap_thresholds;
        let mut gaps = BTreeSet::new();
        if dims.skills.score < g.skills {
            gaps.insert(KeyGap::SkillsLow);
        }
        if dims.experience.score < g.experience {
            gaps.insert(KeyGap::ExperienceLow);
        }
        if dims.location.score < g.location {
            gaps.insert(KeyGap::LocationMismatch);
        }
        if dims.salary.score < g.salary {
            gaps.insert(KeyGap::SalaryUnknownOrLow);
        }
        gaps
    }
}

impl FitScorer for WeightedFitScorer {
    fn score(&self, profile: &CandidateProfile, posting: &JobPosting) -> ScoredJobPosting {
        let dimensions = self.dimensions(profile, posting);
        let overall_score = self.overall(&dimensions);
        let fit_level = self.fit_level(overall_score);
        let key_gaps = self.key_gaps(&dimensions);

        let mean = dimensions.sum() / Dimension::ALL.len() as f64;
        let confidence = round_to((mean / MAX_DIMENSION_SCORE).clamp(0.0, 1.0), 3);

        let matched_criteria = dimensions
            .iter()
            .filter(|(_, score)| *score >= self.matched_threshold)
            .map(|(dimension, _)| dimension)
            .collect();

        ScoredJobPosting {
            posting: posting.clone(),
            dimensions,
            overall_score,
            fit_level,
            key_gaps,
            confidence,
            matched_criteria,
        }
    }

    fn backend(&self) -> &'static str {
        "weighted"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
