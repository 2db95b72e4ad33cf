//! Registry composition — one isolated registry per scrape.
//!
//! The request-scoped collector is registered into a brand-new
//! [`prometheus::Registry`] through a small adapter. Collection itself is
//! async, so [`ScrapeRegistry::gather`] first awaits the collector, checks
//! the returned identities, parks the families in the adapter, and only
//! then runs the registry's synchronous gather.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chgate_collector::Collector;
use prometheus::core::{Collector as PromCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::Registry;
use tracing::debug;

use crate::error::RegistryError;

/// Builds [`ScrapeRegistry`]s, holding the process-wide default metric set.
#[derive(Clone)]
pub struct RegistryComposer {
    process_defaults: Registry,
}

impl RegistryComposer {
    pub fn new(process_defaults: Registry) -> Self {
        Self { process_defaults }
    }

    /// The process-wide default registry.
    pub fn process_defaults(&self) -> &Registry {
        &self.process_defaults
    }

    /// Register `collector` into a new isolated registry.
    ///
    /// With `include_process_defaults`, the process-wide set is appended
    /// after the request's families when gathering.
    pub fn compose(
        &self,
        collector: Box<dyn Collector>,
        include_process_defaults: bool,
    ) -> Result<ScrapeRegistry, RegistryError> {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let source = ScopedSource {
            descs: collector.describe(),
            collected: Arc::clone(&collected),
        };

        let registry = Registry::new();
        registry
            .register(Box::new(source))
            .map_err(|e| RegistryError::DuplicateRegistration(e.to_string()))?;

        Ok(ScrapeRegistry {
            registry,
            collector,
            collected,
            process_defaults: include_process_defaults.then(|| self.process_defaults.clone()),
        })
    }
}

/// A registry scoped to one scrape request.
pub struct ScrapeRegistry {
    registry: Registry,
    collector: Box<dyn Collector>,
    collected: Arc<Mutex<Vec<MetricFamily>>>,
    process_defaults: Option<Registry>,
}

impl ScrapeRegistry {
    /// Collect from the request's collector and return every family to
    /// expose: request families sorted by name, then process defaults.
    ///
    /// Families with the same name in both sources are not deduplicated.
    pub async fn gather(&mut self) -> Result<Vec<MetricFamily>, RegistryError> {
        let families = self.collector.collect().await?;
        let families = check_identities(families)?;
        debug!(
            target = %self.collector.target(),
            families = families.len(),
            "request families collected"
        );

        *self.collected.lock().unwrap_or_else(|e| e.into_inner()) = families;
        let mut out = self.registry.gather();

        if let Some(defaults) = &self.process_defaults {
            out.extend(defaults.gather());
        }
        Ok(out)
    }
}

/// Adapter exposing the request collector's output to the registry.
struct ScopedSource {
    descs: Vec<Desc>,
    collected: Arc<Mutex<Vec<MetricFamily>>>,
}

impl PromCollector for ScopedSource {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        std::mem::take(&mut *self.collected.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Reject output where a family name or a (family, label set) repeats.
/// Empty families are dropped.
fn check_identities(families: Vec<MetricFamily>) -> Result<Vec<MetricFamily>, RegistryError> {
    let mut names = HashSet::new();
    let mut out = Vec::with_capacity(families.len());

    for family in families {
        if family.get_metric().is_empty() {
            continue;
        }
        let name = family.get_name().to_string();
        if !names.insert(name.clone()) {
            return Err(RegistryError::DuplicateRegistration(format!(
                "metric family {name} collected twice"
            )));
        }

        {
            let mut label_sets = HashSet::new();
            for metric in family.get_metric() {
                let mut labels: Vec<(&str, &str)> = metric
                    .get_label()
                    .iter()
                    .map(|l| (l.get_name(), l.get_value()))
                    .collect();
                labels.sort_unstable();
                if !label_sets.insert(labels.clone()) {
                    return Err(RegistryError::DuplicateRegistration(format!(
                        "metric {name}{labels:?} collected twice"
                    )));
                }
            }
        }
        out.push(family);
    }
    Ok(out)
}
