use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Separators used to split a location into comparable tokens.
static RE_LOCATION_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\-/\s]+").unwrap());

/// Anything that is not a letter, digit or whitespace.
static RE_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]+").unwrap());

/// Title tokens that do not distinguish one listing from another.
const SENIORITY_TOKENS: &[&str] = &["sr", "senior", "ii", "iii", "jr", "junior", "lead", "associate"];

const UNKNOWN: &str = "unknown";

/// Identity of a posting for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupKey {
    pub url: Option<String>,
    pub title: String,
    pub company: String,
    pub location: BTreeSet<String>,
}

impl DedupKey {
    pub fn new(
        url: Option<&str>,
        title: &str,
        company: Option<&str>,
        location: Option<&str>,
    ) -> Self {
        Self {
            url: url.and_then(normalize_url),
            title: title_key(title),
            company: company_key(company),
            location: location_tokens(location),
        }
    }

    /// Two postings are the same listing when their URLs match, or, when at
    /// least one URL is missing, when title and company match and the
    /// locations share a token.
    pub fn same_listing(&self, other: &DedupKey) -> bool {
        match (&self.url, &other.url) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.title == other.title
                    && self.company == other.company
                    && !self.location.is_disjoint(&other.location)
            }
        }
    }
}

/// Trims, drops the scheme, lower-cases the host and strips trailing slashes.
/// `http` and `https` therefore produce the same key.
pub fn normalize_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let lower = trimmed.to_lowercase();
    let rest = if lower.starts_with("https://") {
        &trimmed["https://".len()..]
    } else if lower.starts_with("http://") {
        &trimmed["http://".len()..]
    } else {
        trimmed
    };

    let (host, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let key = format!("{}{}", host.to_lowercase(), path);
    let key = key.trim_end_matches('/');

    (!key.is_empty()).then(|| key.to_string())
}

/// Lower-cased title with punctuation and seniority tokens removed.
pub fn title_key(title: &str) -> String {
    let cleaned = RE_PUNCTUATION.replace_all(&title.to_lowercase(), " ").into_owned();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let stripped: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| !SENIORITY_TOKENS.contains(t))
        .collect();

    // A title made only of seniority words keeps them.
    if stripped.is_empty() {
        tokens.join(" ")
    } else {
        stripped.join(" ")
    }
}

pub fn company_key(company: Option<&str>) -> String {
    let key = company
        .map(|c| {
            RE_PUNCTUATION
                .replace_all(&c.to_lowercase(), " ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    if key.is_empty() {
        UNKNOWN.to_string()
    } else {
        key
    }
}

/// Lower-cased tokens of a location; unknown locations become `{"unknown"}`.
pub fn location_tokens(location: Option<&str>) -> BTreeSet<String> {
    let tokens: BTreeSet<String> = location
        .map(|l| {
            RE_LOCATION_SPLIT
                .split(&l.to_lowercase())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if tokens.is_empty() {
        BTreeSet::from([UNKNOWN.to_string()])
    } else {
        tokens
    }
}

/// Token-overlap location equivalence shared by dedup and scoring.
pub fn locations_overlap(a: &str, b: &str) -> bool {
    let a = location_tokens(Some(a));
    let b = location_tokens(Some(b));
    !a.is_disjoint(&b)
}
