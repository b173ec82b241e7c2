//! Configuration management for the qamask pipeline
//!
//! Settings come from `QAMASK_*` environment variables with sensible
//! defaults; command-line flags override the per-task values.

use crate::wikidata::WIKIDATA_QUERY_SERVICE_URL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Dataset file layout
    pub dataset: DatasetConfig,

    /// SPARQL endpoint access
    pub wikidata: WikiDataConfig,

    /// Masking defaults
    pub masking: MaskingConfig,
}

/// Where dataset files live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Root directory for every JSON artifact
    pub root: PathBuf,
}

/// SPARQL endpoint access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiDataConfig {
    /// Endpoint URL
    pub endpoint: String,

    /// User agent sent with every query
    pub user_agent: String,

    /// Seconds between consecutive queries
    pub query_interval_secs: u64,

    /// Maximum retry attempts per query
    pub max_retries: u32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Identifiers per labelling query
    pub part_size: usize,
}

impl WikiDataConfig {
    /// Query pacing as a [`Duration`].
    #[must_use]
    pub fn query_interval(&self) -> Duration {
        Duration::from_secs(self.query_interval_secs)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Masking defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskingConfig {
    /// Minimum accepted label-match fraction, in `[0.0, 1.0]`
    pub threshold: f64,

    /// Natural language of questions and labels
    pub language: String,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let root = std::env::var("QAMASK_DATASET_DIR")
            .unwrap_or_else(|_| String::from("resources/dataset"))
            .into();

        let endpoint = std::env::var("QAMASK_SPARQL_ENDPOINT")
            .unwrap_or_else(|_| String::from(WIKIDATA_QUERY_SERVICE_URL));

        let user_agent = std::env::var("QAMASK_USER_AGENT")
            .unwrap_or_else(|_| format!("qamask/{}", env!("CARGO_PKG_VERSION")));

        let query_interval_secs = std::env::var("QAMASK_QUERY_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(3);

        let max_retries = std::env::var("QAMASK_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let request_timeout_secs = std::env::var("QAMASK_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let part_size = std::env::var("QAMASK_PART_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n >= 1)
            .unwrap_or(50);

        let threshold = std::env::var("QAMASK_MASK_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|t| (0.0..=1.0).contains(t))
            .unwrap_or(0.0);

        let language =
            std::env::var("QAMASK_LANGUAGE").unwrap_or_else(|_| String::from("en"));

        Self {
            dataset: DatasetConfig { root },
            wikidata: WikiDataConfig {
                endpoint,
                user_agent,
                query_interval_secs,
                max_retries,
                request_timeout_secs,
                part_size,
            },
            masking: MaskingConfig {
                threshold,
                language,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = Config::from_env();
        assert!(!config.wikidata.endpoint.is_empty());
        assert!(config.wikidata.part_size >= 1);
        assert!((0.0..=1.0).contains(&config.masking.threshold));
        assert_eq!(config.wikidata.query_interval(), Duration::from_secs(config.wikidata.query_interval_secs));
    }
}
