//! Scrape failures and their HTTP mapping.
//!
//! | Kind | Status |
//! |---|---|
//! | `MissingParameter`, `InvalidTarget` | 400 |
//! | `ModuleNotFound` | 404 |
//! | `ConfigUnreadable`, `ConfigMalformed`, `DuplicateRegistration`, `EncodeFailure` | 500 |
//! | `CollectionFailure` | 502, or 504 when the deadline expired |
//!
//! The body is a short plain-text diagnostic; the kind is repeated in the
//! `x-chgate-error` header.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chgate_collector::{CollectError, TargetError};
use chgate_config::{ConfigError, ResolveError};
use chgate_registry::RegistryError;
use thiserror::Error;

/// Response header carrying [`ScrapeError::kind`].
pub const ERROR_KIND_HEADER: &str = "x-chgate-error";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("uri error, not found {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    ModuleNotFound(#[from] ResolveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    #[error("CollectionFailure: {0}")]
    CollectionFailure(CollectError),

    #[error("CollectionFailure: scrape timed out after {}s", .0.as_secs_f64())]
    CollectionTimeout(Duration),

    #[error("DuplicateRegistration: {0}")]
    DuplicateRegistration(String),

    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
}

impl From<RegistryError> for ScrapeError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::DuplicateRegistration(msg) => ScrapeError::DuplicateRegistration(msg),
            RegistryError::Collection(e) => ScrapeError::CollectionFailure(e),
        }
    }
}

impl ScrapeError {
    /// Taxonomy name, as sent in the `x-chgate-error` header.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::MissingParameter(_) => "MissingParameter",
            ScrapeError::ModuleNotFound(_) => "ModuleNotFound",
            ScrapeError::Config(ConfigError::Unreadable { .. }) => "ConfigUnreadable",
            ScrapeError::Config(ConfigError::Malformed { .. }) => "ConfigMalformed",
            ScrapeError::InvalidTarget(_) => "InvalidTarget",
            ScrapeError::CollectionFailure(_) | ScrapeError::CollectionTimeout(_) => {
                "CollectionFailure"
            }
            ScrapeError::DuplicateRegistration(_) => "DuplicateRegistration",
            ScrapeError::Encode(_) => "EncodeFailure",
        }
    }

    /// Label value for the `outcome` label of `chgate_scrapes_total`.
    pub fn outcome(&self) -> &'static str {
        match self {
            ScrapeError::MissingParameter(_) => "missing_parameter",
            ScrapeError::ModuleNotFound(_) => "module_not_found",
            ScrapeError::Config(_) => "config_error",
            ScrapeError::InvalidTarget(_) => "invalid_target",
            ScrapeError::CollectionFailure(_) => "collection_failure",
            ScrapeError::CollectionTimeout(_) => "collection_timeout",
            ScrapeError::DuplicateRegistration(_) => "duplicate_registration",
            ScrapeError::Encode(_) => "encode_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ScrapeError::MissingParameter(_) | ScrapeError::InvalidTarget(_) => {
                StatusCode::BAD_REQUEST
            }
            ScrapeError::ModuleNotFound(_) => StatusCode::NOT_FOUND,
            ScrapeError::CollectionFailure(_) => StatusCode::BAD_GATEWAY,
            ScrapeError::CollectionTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ScrapeError::Config(_)
            | ScrapeError::DuplicateRegistration(_)
            | ScrapeError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [
                ("content-type", "text/plain; charset=utf-8"),
                (ERROR_KIND_HEADER, self.kind()),
            ],
            self.to_string(),
        )
            .into_response()
    }
}
