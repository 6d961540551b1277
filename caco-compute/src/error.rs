use thiserror::Error;

pub type ComputeResult<T> = Result<T, ComputeError>;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("bootstrap file '{path}' could not be read: {source}")]
    BootstrapRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bootstrap file '{path}' is not valid JSON: {source}")]
    BootstrapParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
