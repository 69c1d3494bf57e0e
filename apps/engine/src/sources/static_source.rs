use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SourceError;
use crate::models::{CandidateProfile, SourceTag};
use crate::sources::{JobSource, SourceBatch};

/// In-memory source: a fixed batch or a canned error, optionally after a delay.
#[derive(Debug, Clone)]
pub struct StaticSource {
    tag: SourceTag,
    outcome: Result<SourceBatch, SourceError>,
    delay: Option<Duration>,
}

impl StaticSource {
    pub fn records(tag: SourceTag, records: Vec<Value>) -> Self {
        Self {
            tag,
            outcome: Ok(SourceBatch::new(records)),
            delay: None,
        }
    }

    pub fn failing(tag: SourceTag, error: SourceError) -> Self {
        Self {
            tag,
            outcome: Err(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_search_criteria(mut self, criteria: Value) -> Self {
        if let Ok(batch) = self.outcome.as_mut() {
            batch.search_criteria = Some(criteria);
        }
        self
    }
}

#[async_trait]
impl JobSource for StaticSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn fetch(&self, _profile: &CandidateProfile) -> Result<SourceBatch, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}
