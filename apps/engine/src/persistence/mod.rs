//! Persistence: writes a finished run next to the profile it was computed for.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AggregatorError;
use crate::models::{AggregationOutcome, CandidateProfile};

/// On-disk shape: `{"profile": ..., "aggregation": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAggregation {
    pub profile: CandidateProfile,
    pub aggregation: AggregationOutcome,
}

#[derive(Serialize)]
struct SavedAggregationRef<'a> {
    profile: &'a CandidateProfile,
    aggregation: &'a AggregationOutcome,
}

/// Where finished runs go. Carried as `Arc<dyn ResultSink>` by callers that
/// want to swap storage.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn save(
        &self,
        profile: &CandidateProfile,
        outcome: &AggregationOutcome,
    ) -> Result<PathBuf, AggregatorError>;
}

/// Pretty-printed JSON file in a directory, created on first save.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
    file_name: String,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn save(
        &self,
        profile: &CandidateProfile,
        outcome: &AggregationOutcome,
    ) -> Result<PathBuf, AggregatorError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_string_pretty(&SavedAggregationRef {
            profile,
            aggregation: outcome,
        })?;

        let path = self.path();
        tokio::fs::write(&path, body).await?;
        info!(path = %path.display(), "Saved aggregation results");
        Ok(path)
    }
}

/// Reads a file written by `JsonFileSink`.
pub async fn load_saved(path: &Path) -> Result<SavedAggregation, AggregatorError> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
