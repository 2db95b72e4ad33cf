//! Error types for collector construction and collection.

use thiserror::Error;

/// The `target` query parameter is not a usable `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid target {target:?}: {reason}")]
pub struct TargetError {
    pub target: String,
    pub reason: &'static str,
}

impl TargetError {
    pub(crate) fn new(target: &str, reason: &'static str) -> Self {
        Self {
            target: target.to_string(),
            reason,
        }
    }
}

/// Failure while a collector talks to its upstream.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("status {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {endpoint}: {reason}")]
    Parse { endpoint: String, reason: String },

    #[error("{0}")]
    Upstream(String),
}

/// Failure to set up the production collector factory at startup.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("invalid scrape uri {uri:?}: {reason}")]
    InvalidScrapeUri { uri: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
