use thiserror::Error;

/// Engine-level error type.
///
/// Only genuinely unrecoverable input surfaces here. Source failures, bad
/// records and scoring failures are absorbed by the pipeline and reported
/// through diagnostics instead.
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("Invalid candidate profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of a single source fetch. Always recovered by the orchestrator.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for SourceError {
    fn from(value: std::io::Error) -> Self {
        SourceError::Transport(value.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(value: serde_json::Error) -> Self {
        SourceError::MalformedResponse(value.to_string())
    }
}
