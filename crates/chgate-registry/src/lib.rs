//! chgate-registry — per-scrape metric registries.
//!
//! Every scrape gets a fresh [`ScrapeRegistry`] holding exactly one
//! request-scoped collector, optionally followed by the process-wide
//! default metric set. The registry lives for one HTTP round trip.
//!
//! # Architecture
//!
//! ```text
//! RegistryComposer
//!   └── compose(collector, include_process_defaults) → ScrapeRegistry
//!
//! ScrapeRegistry::gather()
//!   ├── collector.collect()        (upstream I/O happens here)
//!   ├── identity check             (DuplicateRegistration)
//!   ├── request families           (sorted by name)
//!   └── process defaults           (appended, optional)
//!
//! exposition::encode() → text/plain; version=0.0.4
//! ```

pub mod compose;
pub mod defaults;
pub mod error;
pub mod exposition;

pub use compose::{RegistryComposer, ScrapeRegistry};
pub use defaults::GatewayMetrics;
pub use error::RegistryError;
