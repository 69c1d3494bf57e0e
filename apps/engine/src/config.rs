use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::AggregatorError;
use crate::models::SourceTag;

/// Per-dimension weights for the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub role: f64,
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub salary: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            role: 0.30,
            skills: 0.30,
            experience: 0.20,
            location: 0.10,
            salary: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn as_array(&self) -> [f64; 5] {
        [self.role, self.skills, self.experience, self.location, self.salary]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

/// Overall-score cut-offs for the fit levels (0 – 100 scale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitThresholds {
    pub strong: f64,
    pub medium: f64,
    pub weak: f64,
}

impl Default for FitThresholds {
    fn default() -> Self {
        Self {
            strong: 70.0,
            medium: 50.0,
            weak: 30.0,
        }
    }
}

/// Dimension cut-offs below which a key gap is reported (0 – 3 scale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapThresholds {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub salary: f64,
}

impl Default for GapThresholds {
    fn default() -> Self {
        Self {
            skills: 1.5,
            experience: 1.5,
            location: 1.0,
            salary: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for ShortlistBounds {
    fn default() -> Self {
        Self { min: 8, max: 12 }
    }
}

/// Every tunable of an aggregation run. Passed explicitly to the scorer,
/// ranker and orchestrator; nothing below reads globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub weights: ScoringWeights,
    pub fit_thresholds: FitThresholds,
    pub gap_thresholds: GapThresholds,
    /// A dimension at or above this counts as a matched criterion.
    pub matched_threshold: f64,
    /// Below this many normalized postings a primary source gets its fallback.
    pub min_usable_postings: usize,
    /// Merge tie-break order, highest priority first.
    pub source_priority: Vec<SourceTag>,
    pub shortlist: ShortlistBounds,
    pub source_timeout_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            fit_thresholds: FitThresholds::default(),
            gap_thresholds: GapThresholds::default(),
            matched_threshold: 1.5,
            min_usable_postings: 3,
            source_priority: SourceTag::ALL.to_vec(),
            shortlist: ShortlistBounds::default(),
            source_timeout_secs: 60,
        }
    }
}

impl AggregationConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), AggregatorError> {
        if self
            .weights
            .as_array()
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(AggregatorError::InvalidConfig(
                "dimension weights must be non-negative numbers".to_string(),
            ));
        }
        let t = &self.fit_thresholds;
        if !(t.strong >= t.medium && t.medium >= t.weak) {
            return Err(AggregatorError::InvalidConfig(format!(
                "fit thresholds must be descending, got strong={} medium={} weak={}",
                t.strong, t.medium, t.weak
            )));
        }
        if self.shortlist.min > self.shortlist.max || self.shortlist.max == 0 {
            return Err(AggregatorError::InvalidConfig(format!(
                "shortlist bounds invalid: min={} max={}",
                self.shortlist.min, self.shortlist.max
            )));
        }
        if self.source_priority.is_empty() {
            return Err(AggregatorError::InvalidConfig(
                "source priority list must not be empty".to_string(),
            ));
        }
        if self.source_timeout_secs == 0 {
            return Err(AggregatorError::InvalidConfig(
                "source timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Binary configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_file: String,
    pub rust_log: String,
    pub aggregation: AggregationConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut aggregation = AggregationConfig::default();

        if let Some(v) = optional_env::<usize>("AGGREGATOR_MIN_USABLE_POSTINGS")? {
            aggregation.min_usable_postings = v;
        }
        if let Some(v) = optional_env::<u64>("AGGREGATOR_SOURCE_TIMEOUT_SECS")? {
            aggregation.source_timeout_secs = v;
        }
        if let Some(v) = optional_env::<usize>("AGGREGATOR_SHORTLIST_MIN")? {
            aggregation.shortlist.min = v;
        }
        if let Some(v) = optional_env::<usize>("AGGREGATOR_SHORTLIST_MAX")? {
            aggregation.shortlist.max = v;
        }
        if let Some(v) = optional_env::<f64>("AGGREGATOR_MATCHED_THRESHOLD")? {
            aggregation.matched_threshold = v;
        }
        if let Ok(raw) = std::env::var("AGGREGATOR_SOURCE_PRIORITY") {
            aggregation.source_priority = parse_source_priority(&raw)?;
        }
        if let Ok(raw) = std::env::var("AGGREGATOR_WEIGHTS") {
            aggregation.weights = parse_weights(&raw)?;
        }

        aggregation
            .validate()
            .context("Aggregation settings from environment are invalid")?;

        Ok(Config {
            input_dir: require_env("AGGREGATOR_INPUT_DIR")?.into(),
            output_dir: std::env::var("AGGREGATOR_OUTPUT_DIR")
                .unwrap_or_else(|_| "outputs".to_string())
                .into(),
            output_file: std::env::var("AGGREGATOR_OUTPUT_FILE")
                .unwrap_or_else(|_| "job_aggregation.json".to_string()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            aggregation,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(None),
    }
}

/// Parses `"jsearch,adzuna,ddg"`.
fn parse_source_priority(raw: &str) -> Result<Vec<SourceTag>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<SourceTag>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()
        .context("AGGREGATOR_SOURCE_PRIORITY must be a comma-separated list of sources")
}

/// Parses `"role=0.3,skills=0.3,experience=0.2,location=0.1,salary=0.1"`.
/// Dimensions not mentioned keep their default weight.
fn parse_weights(raw: &str) -> Result<ScoringWeights> {
    let mut weights = ScoringWeights::default();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Weight '{pair}' must look like name=value"))?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("Weight '{pair}' has a non-numeric value"))?;
        match name.trim() {
            "role" => weights.role = value,
            "skills" => weights.skills = value,
            "experience" => weights.experience = value,
            "location" => weights.location = value,
            "salary" => weights.salary = value,
            other => anyhow::bail!("Unknown weight dimension '{other}'"),
        }
    }
    Ok(weights)
}
