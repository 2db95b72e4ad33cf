//! The gateway's own metrics, part of the process-wide default set.

use std::time::Duration;

use prometheus::core::Collector;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

/// Label value used before a module name has been resolved.
///
/// Unresolved names come straight from the query string and are not
/// used as label values.
const UNRESOLVED_MODULE: &str = "";

/// Scrape counters and latency, registered once at startup.
#[derive(Clone)]
pub struct GatewayMetrics {
    scrapes: IntCounterVec,
    duration: HistogramVec,
}

impl GatewayMetrics {
    /// Create the gateway metrics and register them into `registry`.
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let scrapes = IntCounterVec::new(
            Opts::new("scrapes_total", "Scrape requests handled, by module and outcome.")
                .namespace("chgate"),
            &["module", "outcome"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "scrape_duration_seconds",
                "Wall time spent serving scrape requests.",
            )
            .namespace("chgate")
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["module"],
        )?;

        registry.register(Box::new(scrapes.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        Ok(Self { scrapes, duration })
    }

    /// Record one finished scrape. `module` is `None` until it resolved.
    pub fn observe(&self, module: Option<&str>, outcome: &str, elapsed: Duration) {
        let module = module.unwrap_or(UNRESOLVED_MODULE);
        self.scrapes.with_label_values(&[module, outcome]).inc();
        self.duration
            .with_label_values(&[module])
            .observe(elapsed.as_secs_f64());
    }

    /// Scrapes recorded for a module/outcome pair. Never creates a series.
    pub fn scrape_count(&self, module: Option<&str>, outcome: &str) -> u64 {
        let module = module.unwrap_or(UNRESOLVED_MODULE);
        self.scrapes
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                let labels = metric.get_label();
                labels.iter().any(|l| l.get_name() == "module" && l.get_value() == module)
                    && labels.iter().any(|l| l.get_name() == "outcome" && l.get_value() == outcome)
            })
            .map_or(0, |metric| metric.get_counter().get_value() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_observe() {
        let registry = Registry::new();
        let metrics = GatewayMetrics::register(&registry).unwrap();

        metrics.observe(Some("default"), "success", Duration::from_millis(20));
        metrics.observe(Some("default"), "success", Duration::from_millis(30));
        metrics.observe(None, "missing_parameter", Duration::from_millis(1));

        assert_eq!(metrics.scrape_count(Some("default"), "success"), 2);
        assert_eq!(metrics.scrape_count(None, "missing_parameter"), 1);

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["chgate_scrape_duration_seconds", "chgate_scrapes_total"]
        );
    }

    #[test]
    fn double_registration_fails() {
        let registry = Registry::new();
        GatewayMetrics::register(&registry).unwrap();
        assert!(GatewayMetrics::register(&registry).is_err());
    }

    #[test]
    fn counting_does_not_create_series() {
        let registry = Registry::new();
        let metrics = GatewayMetrics::register(&registry).unwrap();

        assert_eq!(metrics.scrape_count(Some("nope"), "success"), 0);
        assert!(registry.gather().is_empty());
    }
}
