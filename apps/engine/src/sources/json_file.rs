use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::SourceError;
use crate::models::{CandidateProfile, SourceTag};
use crate::sources::{JobSource, SourceBatch, SourceRegistration};

/// Reads a source's output from disk.
///
/// Accepts either a bare array of records or an object of the form
/// `{"jobs": [...], "search_criteria": {...}}`.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    tag: SourceTag,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(tag: SourceTag, path: impl Into<PathBuf>) -> Self {
        Self {
            tag,
            path: path.into(),
        }
    }
}

#[async_trait]
impl JobSource for JsonFileSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn fetch(&self, _profile: &CandidateProfile) -> Result<SourceBatch, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::Unavailable(format!("{} not found", self.path.display()))
            } else {
                SourceError::from(e)
            }
        })?;

        let batch = parse_batch(serde_json::from_str(&raw)?)?;
        debug!(
            source = %self.tag,
            path = %self.path.display(),
            records = batch.records.len(),
            "read source file"
        );
        Ok(batch)
    }
}

/// Wires an input directory of source files.
///
/// `jsearch.json`, `adzuna.json` and `ddg.json` are all primaries, queried on
/// every run. An API source gets a fallback only when its own site search file
/// (`jsearch_ddg.json`, `adzuna_ddg.json`) exists, so no file is read twice.
pub fn file_registrations(input_dir: &Path) -> Vec<SourceRegistration> {
    SourceTag::ALL
        .iter()
        .map(|&tag| {
            let primary: Arc<dyn JobSource> = Arc::new(JsonFileSource::new(
                tag,
                input_dir.join(format!("{}.json", tag.as_str())),
            ));
            let registration = SourceRegistration::new(primary);
            if tag == SourceTag::Ddg {
                return registration;
            }

            let site_search = input_dir.join(format!("{}_ddg.json", tag.as_str()));
            if site_search.exists() {
                registration.with_fallback(Arc::new(JsonFileSource::new(SourceTag::Ddg, site_search)))
            } else {
                registration
            }
        })
        .collect()
}

fn parse_batch(value: Value) -> Result<SourceBatch, SourceError> {
    match value {
        Value::Array(records) => Ok(SourceBatch::new(records)),
        Value::Object(mut map) => {
            let records = match map.remove("jobs") {
                Some(Value::Array(records)) => records,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(SourceError::MalformedResponse(format!(
                        "\"jobs\" must be an array, got {}",
                        type_name(&other)
                    )))
                }
            };
            let search_criteria = map.remove("search_criteria").filter(|v| !v.is_null());
            Ok(SourceBatch {
                records,
                search_criteria,
            })
        }
        other => Err(SourceError::MalformedResponse(format!(
            "expected an array or an object with \"jobs\", got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
