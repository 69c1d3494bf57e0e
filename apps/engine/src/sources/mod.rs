//! Source adapters: the only async seam between the engine and the outside
//! world. Each adapter hands back raw JSON records; the Normalizer owns every
//! field mapping.
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SourceError;
use crate::models::{CandidateProfile, SourceTag};

pub mod json_file;
pub mod static_source;

pub use json_file::{file_registrations, JsonFileSource};
pub use static_source::StaticSource;

/// Raw output of one source fetch.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub records: Vec<Value>,
    /// Whatever query the source reports having run, passed through untouched.
    pub search_criteria: Option<Value>,
}

impl SourceBatch {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            search_criteria: None,
        }
    }
}

/// A job board, search API or file that yields raw posting records.
///
/// Carried by the orchestrator as `Arc<dyn JobSource>`.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Tag stamped on every posting this source produces.
    fn tag(&self) -> SourceTag;

    async fn fetch(&self, profile: &CandidateProfile) -> Result<SourceBatch, SourceError>;
}

/// A primary source and the source tried once if the primary comes up short.
#[derive(Clone)]
pub struct SourceRegistration {
    pub primary: Arc<dyn JobSource>,
    pub fallback: Option<Arc<dyn JobSource>>,
}

impl SourceRegistration {
    pub fn new(primary: Arc<dyn JobSource>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn JobSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl std::fmt::Debug for SourceRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistration")
            .field("primary", &self.primary.tag())
            .field("fallback", &self.fallback.as_ref().map(|s| s.tag()))
            .finish()
    }
}
