//! Error types for the label-retrieval side of the pipeline

use thiserror::Error;

/// Errors that can occur while querying the SPARQL endpoint
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint asked us to slow down (HTTP 429)
    #[error("endpoint rate limit hit")]
    TooManyRequests,

    /// Server error with status code
    #[error("server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// The endpoint answered 200 but not with the expected JSON shape
    #[error("malformed SPARQL response: {0}")]
    MalformedResponse(String),

    /// Invalid endpoint URL
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether retrying the request may help.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FetchError::TooManyRequests
                | FetchError::Timeout
                | FetchError::ServerError(500..=599)
        )
    }
}
