//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong in model lifecycle or inference supervision.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown model id.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Inference start requested before the model file exists locally.
    #[error("model {0} is not downloaded")]
    ModelNotDownloaded(String),

    /// Download received a non-2xx/3xx response.
    #[error("download failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Redirect chase exceeded the hop cap (redirect cycle or misbehaving host).
    #[error("download exceeded {0} redirect hops")]
    TooManyRedirects(usize),

    /// Transport failure while talking to the download host or the local server.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File write/delete failure, or a failed subprocess spawn.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Readiness marker not observed within the startup window.
    #[error("inference server not ready after {0} seconds")]
    StartupTimeout(u64),

    /// Query issued without a live, ready inference server.
    #[error("inference server is not ready")]
    NotReady,

    /// The inference server rejected a query; carries the response body.
    #[error("inference server error: {0}")]
    Upstream(String),
}
