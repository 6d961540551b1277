use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("compute agent returned an error: {0}")]
    ComputeFailure(serde_json::Value),

    #[error("grid agent response malformed: {0}")]
    MalformedGridResponse(String),
}

pub type CoordinationResult<T> = Result<T, CoordinationError>;
