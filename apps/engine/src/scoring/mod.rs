// Fit Scorer
// Five independent dimension scores per posting, combined with configurable
// weights. Pure and synchronous; the orchestrator calls it after dedup.

pub mod dimensions;
pub mod fit_scoring;
pub mod similarity;

pub use fit_scoring::{FitScorer, WeightedFitScorer};
pub use similarity::{LevenshteinSimilarity, SimilarityMetric};
