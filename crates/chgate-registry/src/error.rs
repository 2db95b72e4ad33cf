//! Error types for registry composition and gathering.

use chgate_collector::CollectError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The same metric identity was registered or collected twice.
    #[error("DuplicateRegistration: {0}")]
    DuplicateRegistration(String),

    /// The request-scoped collector failed to produce samples.
    #[error(transparent)]
    Collection(#[from] CollectError),
}
