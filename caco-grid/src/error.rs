use thiserror::Error;

pub type GridResult<T> = Result<T, GridError>;

/// Upstream fetch errors. None of these are surfaced to the RPC caller —
/// the grid provider always substitutes a synthetic fallback series
/// instead (spec.md §4.3/§7). The variants exist so the fallback path can
/// log *why* it triggered.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned non-success status {0}")]
    Status(reqwest::StatusCode),

    #[error("upstream response was not parseable JSON: {0}")]
    Parse(String),

    #[error("upstream response contained no data")]
    EmptyData,

    #[error("invalid window: {0}")]
    InvalidWindow(String),
}
