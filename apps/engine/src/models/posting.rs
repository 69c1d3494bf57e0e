use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Origin of a posting. Declaration order is the default merge priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Jsearch,
    Adzuna,
    Ddg,
}

impl SourceTag {
    pub const ALL: [SourceTag; 3] = [SourceTag::Jsearch, SourceTag::Adzuna, SourceTag::Ddg];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Jsearch => "jsearch",
            SourceTag::Adzuna => "adzuna",
            SourceTag::Ddg => "ddg",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jsearch" => Ok(SourceTag::Jsearch),
            "adzuna" => Ok(SourceTag::Adzuna),
            "ddg" | "duckduckgo" => Ok(SourceTag::Ddg),
            other => Err(format!("unknown source tag '{other}'")),
        }
    }
}

/// Canonical per-listing record.
///
/// Every optional field uses `None` as the "unknown" sentinel. A known but empty
/// skill list is `Some(vec![])` and is treated differently from `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: Option<String>,
    pub location_area: Option<String>,
    pub url: Option<String>,
    pub source: SourceTag,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub job_type: Option<String>,
    pub remote_type: Option<String>,
    pub experience_required: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub preferred_skills: Option<Vec<String>>,
}

impl JobPosting {
    /// A posting with only a title and source known.
    pub fn new(title: impl Into<String>, source: SourceTag) -> Self {
        Self {
            title: title.into(),
            company: None,
            location_area: None,
            url: None,
            source,
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            job_type: None,
            remote_type: None,
            experience_required: None,
            required_skills: None,
            preferred_skills: None,
        }
    }

    pub fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    pub fn has_salary(&self) -> bool {
        self.salary_min.is_some() || self.salary_max.is_some()
    }

    /// Number of known fields among the ones that make a posting "complete"
    /// for merge purposes.
    pub fn completeness(&self) -> usize {
        [
            self.salary_min.is_some(),
            self.salary_max.is_some(),
            self.required_skills.is_some(),
            self.preferred_skills.is_some(),
            self.experience_required.is_some(),
            self.remote_type.is_some(),
        ]
        .iter()
        .filter(|known| **known)
        .count()
    }

    /// Required and preferred skills, in order, or `None` when both are unknown.
    pub fn all_skills(&self) -> Option<Vec<&str>> {
        if self.required_skills.is_none() && self.preferred_skills.is_none() {
            return None;
        }
        let skills = self
            .required_skills
            .iter()
            .chain(self.preferred_skills.iter())
            .flatten()
            .map(String::as_str)
            .collect();
        Some(skills)
    }

    pub fn is_remote(&self) -> bool {
        self.remote_type
            .as_deref()
            .is_some_and(|r| r.to_lowercase().contains("remote"))
    }
}
