//! Collector and factory traits.
//!
//! Both are object-safe so the exposition server can hold an
//! `Arc<dyn CollectorFactory>` and swap in a mock for tests.

use std::future::Future;
use std::pin::Pin;

use chgate_config::Credentials;
use prometheus::core::Desc;
use prometheus::proto::MetricFamily;

use crate::error::{CollectError, TargetError};
use crate::target::ScrapeTarget;

/// Boxed future returned by [`Collector::collect`].
pub type CollectFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<MetricFamily>, CollectError>> + Send + 'a>>;

/// A metric source bound to one target and one set of credentials.
///
/// Owned by a single scrape and dropped with it. Dropping the future
/// returned by `collect` abandons any in-flight upstream I/O.
pub trait Collector: Send + Sync {
    /// The target this collector was built for.
    fn target(&self) -> &ScrapeTarget;

    /// Descriptors known before collection. Collectors whose families are
    /// only discovered while collecting return none.
    fn describe(&self) -> Vec<Desc> {
        Vec::new()
    }

    /// Talk to the upstream and produce metric families.
    fn collect(&self) -> CollectFuture<'_>;
}

/// Builds request-scoped collectors.
pub trait CollectorFactory: Send + Sync {
    /// Validate `target` and bind it with `credentials` into a new collector.
    ///
    /// Must not perform network I/O. `insecure_tls` disables upstream
    /// certificate verification for this collector.
    fn build(
        &self,
        target: &str,
        credentials: Credentials,
        insecure_tls: bool,
    ) -> Result<Box<dyn Collector>, TargetError>;
}
