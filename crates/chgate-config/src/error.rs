//! Error types for module configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce a [`Configuration`](crate::Configuration).
///
/// There is no partial success: a load either yields every module in the
/// file or one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read (missing, permissions, not a file).
    #[error("ConfigUnreadable: read conf.yml fail, path: {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but does not match the module schema.
    #[error("ConfigMalformed: unmarshal conf.yml fail: {source}")]
    Malformed {
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failure to resolve a module name to credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("not found module in conf.yml")]
    ModuleNotFound(String),
}
