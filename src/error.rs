//! Unified error handling for the qamask crate
//!
//! Domain modules define their own `thiserror` enums close to the code
//! ([`UnicodeError`], [`LcsError`], [`MaskError`], [`FetchError`]); this
//! module wraps them in a single [`Error`] for callers that cross module
//! boundaries, with a coarse [`ErrorCategory`] for handling strategies.

use crate::masking::MaskError;
use crate::suffix_tree::lcs::LcsError;
use crate::unicode::UnicodeError;
use crate::utils::error::FetchError;
use std::io;
use thiserror::Error;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Text decoding and size limits
    Text,
    /// Suffix-tree and LCS alignment
    Alignment,
    /// Label-to-question masking
    Masking,
    /// Endpoint and HTTP failures
    Network,
    /// File-system and serialization failures
    Storage,
    /// Configuration and usage errors
    Config,
    /// Everything else
    Other,
}

/// Unified error type for the qamask crate
#[derive(Error, Debug)]
pub enum Error {
    /// Text ingestion errors
    #[error("text error: {0}")]
    Unicode(#[from] UnicodeError),

    /// LCS-layer errors
    #[error("alignment error: {0}")]
    Lcs(#[from] LcsError),

    /// Masking-layer errors
    #[error("masking error: {0}")]
    Mask(#[from] MaskError),

    /// Endpoint fetch errors
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The error's category for handling strategies.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unicode(_) => ErrorCategory::Text,
            Self::Lcs(_) => ErrorCategory::Alignment,
            Self::Mask(_) => ErrorCategory::Masking,
            Self::Fetch(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Io(_) | Self::Json(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether retrying the failed operation may help. Only transient
    /// network failures qualify; core errors are deterministic.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Http(_) | Self::Io(_) => true,
            _ => false,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
