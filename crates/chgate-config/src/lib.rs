//! chgate-config — module credentials for the scrape gateway.
//!
//! A module is a named credential profile. The gateway resolves the
//! `module` query parameter of every scrape against the module file
//! (`conf/conf.yml` by default) and hands the matching credentials to the
//! collector for that one request.
//!
//! # Architecture
//!
//! ```text
//! ConfigStore
//!   └── load() → Configuration   (fresh read, or mtime-checked cache)
//!
//! Configuration
//!   └── resolve(name) → Credentials   (first match in document order)
//! ```

pub mod error;
pub mod model;
pub mod store;

pub use error::{ConfigError, ResolveError};
pub use model::{Configuration, Credentials, Module};
pub use store::{ConfigStore, DEFAULT_CONFIG_PATH};
