use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AggregatorError;

/// Maximum number of skills carried into scoring.
pub const MAX_TOP_SKILLS: usize = 3;

/// Generic languages, soft skills and resume filler that say little about fit.
const LOW_SIGNAL_SKILLS: &[&str] = &[
    "python", "java", "c++", "c", "c#", "javascript", "js", "typescript", "go", "golang", "ruby",
    "php", "rust", "kotlin", "swift", "scala",
    "communication", "leadership", "teamwork", "collaboration", "problem solving",
    "critical thinking", "creativity",
    "english", "hindi", "marathi", "bengali", "sales", "marketing", "management",
    "microsoft office", "excel", "powerpoint", "word",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePreference {
    Remote,
    Hybrid,
    Onsite,
    #[default]
    Any,
}

impl RemotePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemotePreference::Remote => "remote",
            RemotePreference::Hybrid => "hybrid",
            RemotePreference::Onsite => "onsite",
            RemotePreference::Any => "any",
        }
    }

    /// Preferences that accept a fully remote posting.
    pub fn accepts_remote(&self) -> bool {
        matches!(
            self,
            RemotePreference::Remote | RemotePreference::Hybrid | RemotePreference::Any
        )
    }
}

impl fmt::Display for RemotePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemotePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" => Ok(RemotePreference::Remote),
            "hybrid" => Ok(RemotePreference::Hybrid),
            "onsite" | "on-site" | "on_site" | "office" => Ok(RemotePreference::Onsite),
            "any" | "" => Ok(RemotePreference::Any),
            other => Err(format!("unknown remote preference '{other}'")),
        }
    }
}

/// Resume-derived facts, as produced by the resume intake collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeRecord {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub years_experience: Option<f64>,
    #[serde(default)]
    pub top_technical_skills: Vec<String>,
}

/// User-stated preferences from the job intake form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeRecord {
    #[serde(default)]
    pub preferred_role: String,
    #[serde(default)]
    pub user_reported_years_experience: Option<f64>,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    #[serde(default)]
    pub remote_preference: Option<String>,
    #[serde(default, alias = "target_salary_lpa")]
    pub target_salary: Option<f64>,
}

/// The normalized candidate view every scorer reads. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub preferred_role: String,
    pub locations: Vec<String>,
    pub remote_preference: RemotePreference,
    pub target_salary: Option<f64>,
    pub years_experience: f64,
    pub top_skills: Vec<String>,
}

impl CandidateProfile {
    pub fn new(
        preferred_role: impl Into<String>,
        locations: Vec<String>,
        remote_preference: RemotePreference,
        target_salary: Option<f64>,
        years_experience: f64,
        top_skills: Vec<String>,
    ) -> Result<Self, AggregatorError> {
        let profile = Self {
            preferred_role: preferred_role.into(),
            locations,
            remote_preference,
            target_salary,
            years_experience,
            top_skills,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Resolves a profile from the resume and intake records.
    ///
    /// Locations: resume location first, then stated preferences, deduplicated.
    /// Skills: deny-listed tokens dropped, first three kept; if the deny-list
    /// removes everything the raw list is used instead.
    /// Experience: self-reported years win over the resume estimate.
    pub fn from_records(
        resume: &ResumeRecord,
        intake: &IntakeRecord,
    ) -> Result<Self, AggregatorError> {
        let mut locations: Vec<String> = Vec::new();
        let candidates = resume
            .location
            .iter()
            .chain(intake.preferred_locations.iter());
        for loc in candidates {
            let loc = loc.trim();
            if !loc.is_empty() && !locations.iter().any(|l| l == loc) {
                locations.push(loc.to_string());
            }
        }

        let years_experience = intake
            .user_reported_years_experience
            .or(resume.years_experience)
            .unwrap_or(0.0);

        let remote_preference = intake
            .remote_preference
            .as_deref()
            .map(|p| p.parse::<RemotePreference>().unwrap_or_default())
            .unwrap_or_default();

        Self::new(
            intake.preferred_role.trim(),
            locations,
            remote_preference,
            intake.target_salary,
            years_experience,
            select_top_skills(&resume.top_technical_skills),
        )
    }

    pub fn validate(&self) -> Result<(), AggregatorError> {
        if !self.years_experience.is_finite() || self.years_experience < 0.0 {
            return Err(AggregatorError::InvalidProfile(format!(
                "years_experience must be a non-negative number, got {}",
                self.years_experience
            )));
        }
        if self.top_skills.len() > MAX_TOP_SKILLS {
            return Err(AggregatorError::InvalidProfile(format!(
                "at most {MAX_TOP_SKILLS} top skills allowed, got {}",
                self.top_skills.len()
            )));
        }
        if let Some(target) = self.target_salary {
            if !target.is_finite() || target < 0.0 {
                return Err(AggregatorError::InvalidProfile(format!(
                    "target_salary must be a non-negative number, got {target}"
                )));
            }
        }
        Ok(())
    }
}

/// Picks up to three high-signal skills, preserving order.
pub fn select_top_skills(raw: &[String]) -> Vec<String> {
    let deny: HashSet<&str> = LOW_SIGNAL_SKILLS.iter().copied().collect();
    let cleaned: Vec<&str> = raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();

    let high_signal: Vec<String> = cleaned
        .iter()
        .filter(|s| !deny.contains(s.to_lowercase().as_str()))
        .take(MAX_TOP_SKILLS)
        .map(|s| s.to_string())
        .collect();

    if high_signal.is_empty() {
        cleaned
            .into_iter()
            .take(MAX_TOP_SKILLS)
            .map(str::to_string)
            .collect()
    } else {
        high_signal
    }
}
