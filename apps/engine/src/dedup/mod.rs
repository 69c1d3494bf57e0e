//! Deduplicator: collapses postings that describe the same real-world listing.
//!
//! Grouping is the transitive closure of `DedupKey::same_listing`. Within a
//! group the representative is picked by a total order:
//! URL present > more known fields > source priority > earlier input position.
//! Losers only ever fill gaps in the winner, they never overwrite it.

pub mod keys;

use std::cmp::Ordering;

use tracing::debug;

use crate::models::{JobPosting, SourceTag};

pub use keys::{locations_overlap, DedupKey};

/// Returns one representative per distinct listing, in order of each group's
/// first appearance in `postings`.
pub fn dedupe(postings: &[JobPosting], source_priority: &[SourceTag]) -> Vec<JobPosting> {
    let keys: Vec<DedupKey> = postings.iter().map(key_of).collect();

    let mut groups = DisjointSet::new(postings.len());
    for i in 0..postings.len() {
        for j in (i + 1)..postings.len() {
            if keys[i].same_listing(&keys[j]) {
                groups.union(i, j);
            }
        }
    }

    let mut clusters: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in 0..postings.len() {
        let root = groups.find(i);
        match clusters.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => clusters.push((root, vec![i])),
        }
    }

    clusters
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|&a, &b| merge_order(postings, source_priority, a, b));
            let mut winner = postings[members[0]].clone();
            for &loser in &members[1..] {
                backfill(&mut winner, &postings[loser]);
            }
            if members.len() > 1 {
                debug!(
                    title = %winner.title,
                    source = %winner.source,
                    merged = members.len(),
                    "merged duplicate postings"
                );
            }
            winner
        })
        .collect()
}

pub fn key_of(posting: &JobPosting) -> DedupKey {
    DedupKey::new(
        posting.url.as_deref(),
        &posting.title,
        posting.company.as_deref(),
        posting.location_area.as_deref(),
    )
}

/// Best candidate first.
fn merge_order(
    postings: &[JobPosting],
    source_priority: &[SourceTag],
    a: usize,
    b: usize,
) -> Ordering {
    let (pa, pb) = (&postings[a], &postings[b]);
    let rank = |s: SourceTag| {
        source_priority
            .iter()
            .position(|p| *p == s)
            .unwrap_or(source_priority.len())
    };

    pb.has_url()
        .cmp(&pa.has_url())
        .then_with(|| pb.completeness().cmp(&pa.completeness()))
        .then_with(|| rank(pa.source).cmp(&rank(pb.source)))
        .then_with(|| a.cmp(&b))
}

/// Fills the winner's unknown non-identity fields from a duplicate.
/// Title, company, location and URL are left alone so a second pass groups
/// exactly as the first one did.
fn backfill(winner: &mut JobPosting, other: &JobPosting) {
    if !winner.has_salary() && other.has_salary() {
        winner.salary_min = other.salary_min;
        winner.salary_max = other.salary_max;
        if winner.salary_currency.is_none() {
            winner.salary_currency = other.salary_currency.clone();
        }
    } else if winner.salary_currency.is_none()
        && winner.salary_min == other.salary_min
        && winner.salary_max == other.salary_max
    {
        winner.salary_currency = other.salary_currency.clone();
    }

    fill(&mut winner.job_type, &other.job_type);
    fill(&mut winner.remote_type, &other.remote_type);
    fill(&mut winner.experience_required, &other.experience_required);
    fill(&mut winner.required_skills, &other.required_skills);
    fill(&mut winner.preferred_skills, &other.preferred_skills);
}

fn fill<T: Clone>(slot: &mut Option<T>, other: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(other);
    }
}

/// Union-find over posting indices.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // keep the smaller index as root so roots follow input order
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
