//! String similarity behind a small trait so the role scorer can swap metrics.

/// A normalized similarity: `ratio(a, b)` is in `[0, 1]`, symmetric, and
/// `ratio(a, a) == 1`.
pub trait SimilarityMetric: Send + Sync {
    fn ratio(&self, a: &str, b: &str) -> f64;
}

/// Normalized Levenshtein: `1 - distance / max(len_a, len_b)`, counted in chars.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinSimilarity;

impl SimilarityMetric for LevenshteinSimilarity {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b).clamp(0.0, 1.0)
    }
}
