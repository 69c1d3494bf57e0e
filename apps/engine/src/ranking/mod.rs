//! Ranker/Selector: orders scored postings and cuts the shortlist.
//!
//! Ranking reads the `matched_criteria` the scorer already derived, so the
//! matched threshold lives in one place.

use std::cmp::Ordering;

use crate::config::ShortlistBounds;
use crate::models::{Dimension, FitLevel, ScoredJobPosting};

/// Orders postings best-first.
///
/// Keys, first discriminating one wins:
/// 1. number of matched dimensions, descending
/// 2. skills matched before skills not matched
/// 3. overall score, descending
/// 4. input order (the sort is stable)
pub fn rank(mut scored: Vec<ScoredJobPosting>) -> Vec<ScoredJobPosting> {
    scored.sort_by(compare);
    scored
}

fn compare(a: &ScoredJobPosting, b: &ScoredJobPosting) -> Ordering {
    b.matched_count()
        .cmp(&a.matched_count())
        .then_with(|| b.matches(Dimension::Skills).cmp(&a.matches(Dimension::Skills)))
        .then_with(|| b.overall_score.total_cmp(&a.overall_score))
}

/// Takes the first `min(bounds.min, len)` postings unconditionally, then keeps
/// going up to `bounds.max` while postings are not aspirational. Never pads.
pub fn select(ranked: &[ScoredJobPosting], bounds: &ShortlistBounds) -> Vec<ScoredJobPosting> {
    let floor = bounds.min.min(ranked.len());
    let mut selected: Vec<ScoredJobPosting> = ranked[..floor].to_vec();

    for posting in ranked[floor..].iter().take(bounds.max.saturating_sub(floor)) {
        if posting.fit_level == FitLevel::Aspirational {
            break;
        }
        selected.push(posting.clone());
    }
    selected
}
