use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::posting::JobPosting;

/// Upper bound of every dimension score.
pub const MAX_DIMENSION_SCORE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Role,
    Skills,
    Experience,
    Location,
    Salary,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Role,
        Dimension::Skills,
        Dimension::Experience,
        Dimension::Location,
        Dimension::Salary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Role => "role",
            Dimension::Skills => "skills",
            Dimension::Experience => "experience",
            Dimension::Location => "location",
            Dimension::Salary => "salary",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationReason {
    ExactMatch,
    TokenOverlap,
    RemoteCompatible,
    JobRemoteUserFlexible,
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryReason {
    NoExpectation,
    SalaryUnknown,
    MeetsExpectation,
    Near,
    Below,
    FarBelow,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleScore {
    pub score: f64,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillsScore {
    pub score: f64,
    pub matched_skills: Vec<String>,
    /// False when the posting carried no skill information at all.
    pub job_skills_known: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceScore {
    pub score: f64,
    /// Largest number found in the posting's requirement text.
    pub required_years: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationScore {
    pub score: f64,
    pub reason: LocationReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryScore {
    pub score: f64,
    pub reason: SalaryReason,
}

/// The five independent `[0, 3]` sub-scores with their evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub role: RoleScore,
    pub skills: SkillsScore,
    pub experience: ExperienceScore,
    pub location: LocationScore,
    pub salary: SalaryScore,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Role => self.role.score,
            Dimension::Skills => self.skills.score,
            Dimension::Experience => self.experience.score,
            Dimension::Location => self.location.score,
            Dimension::Salary => self.salary.score,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, s)| s).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitLevel {
    Strong,
    Medium,
    Weak,
    Aspirational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyGap {
    SkillsLow,
    ExperienceLow,
    LocationMismatch,
    SalaryUnknownOrLow,
}

/// A posting with its fit assessment. Derived once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredJobPosting {
    pub posting: JobPosting,
    pub dimensions: DimensionScores,
    pub overall_score: f64, // 0 – 100
    pub fit_level: FitLevel,
    pub key_gaps: BTreeSet<KeyGap>,
    pub confidence: f64, // 0 – 1
    /// Dimensions at or above the matched threshold, in dimension order.
    pub matched_criteria: Vec<Dimension>,
}

impl ScoredJobPosting {
    pub fn matched_count(&self) -> usize {
        self.matched_criteria.len()
    }

    pub fn matches(&self, dimension: Dimension) -> bool {
        self.matched_criteria.contains(&dimension)
    }
}
