//! chgate-collector — request-scoped metric collection.
//!
//! A [`Collector`] is built for exactly one scrape: it owns the target
//! address and the credentials resolved for that request, and performs no
//! I/O until [`Collector::collect`] is awaited. A [`CollectorFactory`]
//! builds collectors; the production factory talks to the ClickHouse HTTP
//! interface, tests inject their own.
//!
//! # Architecture
//!
//! ```text
//! CollectorFactory::build(target, credentials, insecure_tls)
//!   ├── ScrapeTarget::parse()  → host:port or TargetError
//!   └── Box<dyn Collector>     (no network I/O yet)
//!
//! Collector::collect()
//!   └── ClickHouse queries → Vec<MetricFamily>
//! ```

pub mod clickhouse;
pub mod collector;
pub mod error;
mod parse;
pub mod target;

pub use clickhouse::{ClickHouseCollector, ClickHouseCollectorFactory};
pub use collector::{CollectFuture, Collector, CollectorFactory};
pub use error::{CollectError, FactoryError, TargetError};
pub use target::ScrapeTarget;
