//! Error types shared by every CACO crate.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced while working with the shared time model or domain
/// entities.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid timestamp '{0}': {1}")]
    InvalidTimestamp(String, String),

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
