//! ClickHouse collector — scrapes the ClickHouse HTTP interface.
//!
//! Each collect runs five read-only queries against the `system` database
//! and turns the TabSeparated results into metric families:
//!
//! | Query | Families |
//! |---|---|
//! | `system.metrics` | `clickhouse_<metric>` gauges |
//! | `system.asynchronous_metrics` | `clickhouse_<metric>` gauges |
//! | `system.events` | `clickhouse_<event>_total` counters |
//! | `system.parts` | `clickhouse_table_parts_{bytes,count,rows}` by database, table |
//! | `system.disks` | `clickhouse_disk_{free,total}_space_in_bytes` by disk |
//!
//! Credentials go out as `X-ClickHouse-User` / `X-ClickHouse-Key` headers.

use std::collections::HashSet;

use chgate_config::Credentials;
use prometheus::core::Collector as _;
use prometheus::proto::MetricFamily;
use prometheus::{Counter, Gauge, GaugeVec, Opts};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::collector::{CollectFuture, Collector, CollectorFactory};
use crate::error::{CollectError, FactoryError, TargetError};
use crate::parse::{metric_name, parse_key_values, parse_number, parse_rows};
use crate::target::ScrapeTarget;

const NAMESPACE: &str = "clickhouse";

const METRICS_QUERY: &str = "select metric, value from system.metrics";
const ASYNC_METRICS_QUERY: &str = "select replaceRegexpAll(toString(metric), '-', '_') AS metric, value from system.asynchronous_metrics";
const EVENTS_QUERY: &str = "select event, value from system.events";
const PARTS_QUERY: &str = "select database, table, sum(bytes) as bytes, count() as parts, sum(rows) as rows from system.parts where active = 1 group by database, table";
const DISKS_QUERY: &str = "select name, sum(free_space) as free_space_in_bytes, sum(total_space) as total_space_in_bytes from system.disks group by name";

/// Longest upstream error body echoed into a [`CollectError`].
const MAX_ERROR_BODY: usize = 256;

/// Collector for one ClickHouse server and one credential pair.
pub struct ClickHouseCollector {
    client: Client,
    endpoint: Url,
    target: ScrapeTarget,
    credentials: Credentials,
}

impl ClickHouseCollector {
    async fn query(&self, sql: &str) -> Result<String, CollectError> {
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .query(&[("query", sql)]);
        if !self.credentials.user.is_empty() {
            request = request.header("X-ClickHouse-User", self.credentials.user.as_str());
        }
        if !self.credentials.password.is_empty() {
            request = request.header("X-ClickHouse-Key", self.credentials.password.as_str());
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(CollectError::Status {
                endpoint: self.endpoint.to_string(),
                status: status.as_u16(),
                body: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }
        Ok(body)
    }

    fn transport_error(&self, e: reqwest::Error) -> CollectError {
        CollectError::Transport {
            endpoint: self.endpoint.to_string(),
            source: e.without_url(),
        }
    }

    fn parse_error(&self, reason: String) -> CollectError {
        CollectError::Parse {
            endpoint: self.endpoint.to_string(),
            reason,
        }
    }

    async fn scrape(&self) -> Result<Vec<MetricFamily>, CollectError> {
        let mut families = FamilySet::default();

        let metrics = self.query(METRICS_QUERY).await?;
        for (key, value) in parse_key_values(&metrics).map_err(|e| self.parse_error(e))? {
            families.gauge(
                &format!("{NAMESPACE}_{}", metric_name(&key)),
                &format!("Number of {key} currently processed"),
                value,
            );
        }

        let async_metrics = self.query(ASYNC_METRICS_QUERY).await?;
        for (key, value) in parse_key_values(&async_metrics).map_err(|e| self.parse_error(e))? {
            families.gauge(
                &format!("{NAMESPACE}_{}", metric_name(&key)),
                &format!("Number of {key} async processed"),
                value,
            );
        }

        let events = self.query(EVENTS_QUERY).await?;
        for (key, value) in parse_key_values(&events).map_err(|e| self.parse_error(e))? {
            families.counter(
                &format!("{NAMESPACE}_{}_total", metric_name(&key)),
                &format!("Number of {key} total processed"),
                value,
            );
        }

        let parts = self.query(PARTS_QUERY).await?;
        let mut part_gauges = LabeledGauges::new(
            &[
                ("table_parts_bytes", "Table size in bytes"),
                ("table_parts_count", "Number of parts of the table"),
                ("table_parts_rows", "Number of rows in the table"),
            ],
            &["database", "table"],
        );
        for row in parse_rows(&parts, 5).map_err(|e| self.parse_error(e))? {
            let values = [
                parse_number(row[2]).map_err(|e| self.parse_error(e))?,
                parse_number(row[3]).map_err(|e| self.parse_error(e))?,
                parse_number(row[4]).map_err(|e| self.parse_error(e))?,
            ];
            part_gauges.set(&[row[0], row[1]], &values);
        }
        families.extend(part_gauges.collect());

        let disks = self.query(DISKS_QUERY).await?;
        let mut disk_gauges = LabeledGauges::new(
            &[
                ("disk_free_space_in_bytes", "Disks free_space_in_bytes capacity"),
                ("disk_total_space_in_bytes", "Disks total_space_in_bytes capacity"),
            ],
            &["disk"],
        );
        for row in parse_rows(&disks, 3).map_err(|e| self.parse_error(e))? {
            let values = [
                parse_number(row[1]).map_err(|e| self.parse_error(e))?,
                parse_number(row[2]).map_err(|e| self.parse_error(e))?,
            ];
            disk_gauges.set(&[row[0]], &values);
        }
        families.extend(disk_gauges.collect());

        let families = families.into_inner();
        debug!(target = %self.target, families = families.len(), "clickhouse scrape complete");
        Ok(families)
    }
}

impl Collector for ClickHouseCollector {
    fn target(&self) -> &ScrapeTarget {
        &self.target
    }

    fn collect(&self) -> CollectFuture<'_> {
        Box::pin(self.scrape())
    }
}

/// Builds [`ClickHouseCollector`]s from the `--scrape_uri` template.
///
/// The template contributes scheme and path; the request contributes
/// host and port. Two pooled HTTP clients are kept, one per TLS policy.
/// They carry no credentials.
pub struct ClickHouseCollectorFactory {
    scheme: String,
    path: String,
    verified: Client,
    unverified: Client,
}

impl ClickHouseCollectorFactory {
    pub fn new(scrape_uri: &str) -> Result<Self, FactoryError> {
        let template = Url::parse(scrape_uri).map_err(|e| FactoryError::InvalidScrapeUri {
            uri: scrape_uri.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(template.scheme(), "http" | "https") {
            return Err(FactoryError::InvalidScrapeUri {
                uri: scrape_uri.to_string(),
                reason: format!("unsupported scheme {:?}", template.scheme()),
            });
        }

        let user_agent = concat!("chgate/", env!("CARGO_PKG_VERSION"));
        let verified = Client::builder().user_agent(user_agent).build()?;
        let unverified = Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            scheme: template.scheme().to_string(),
            path: template.path().to_string(),
            verified,
            unverified,
        })
    }

    /// The URL a collector for `target` would query.
    pub fn endpoint_for(&self, target: &ScrapeTarget) -> Result<Url, TargetError> {
        let raw = format!("{}://{}{}", self.scheme, target, self.path);
        let url = Url::parse(&raw).map_err(|_| TargetError::new(&target.to_string(), "not a valid host"))?;
        if url.host_str().is_none() {
            return Err(TargetError::new(&target.to_string(), "missing host"));
        }
        Ok(url)
    }
}

impl CollectorFactory for ClickHouseCollectorFactory {
    fn build(
        &self,
        target: &str,
        credentials: Credentials,
        insecure_tls: bool,
    ) -> Result<Box<dyn Collector>, TargetError> {
        let target = ScrapeTarget::parse(target)?;
        let endpoint = self.endpoint_for(&target)?;
        let client = if insecure_tls {
            self.unverified.clone()
        } else {
            self.verified.clone()
        };
        Ok(Box::new(ClickHouseCollector {
            client,
            endpoint,
            target,
            credentials,
        }))
    }
}

/// Families in first-seen order, one per name.
///
/// `system.metrics` and `system.asynchronous_metrics` may name the same
/// metric; the first one wins.
#[derive(Default)]
struct FamilySet {
    names: HashSet<String>,
    families: Vec<MetricFamily>,
}

impl FamilySet {
    fn gauge(&mut self, name: &str, help: &str, value: f64) {
        if self.names.contains(name) {
            debug!(%name, "skipping repeated clickhouse metric");
            return;
        }
        match Gauge::with_opts(Opts::new(name, help)) {
            Ok(gauge) => {
                gauge.set(value);
                self.extend(gauge.collect());
            }
            Err(e) => warn!(%name, error = %e, "skipping unrepresentable clickhouse metric"),
        }
    }

    fn counter(&mut self, name: &str, help: &str, value: f64) {
        if self.names.contains(name) {
            debug!(%name, "skipping repeated clickhouse event");
            return;
        }
        match Counter::with_opts(Opts::new(name, help)) {
            Ok(counter) => {
                if value > 0.0 {
                    counter.inc_by(value);
                }
                self.extend(counter.collect());
            }
            Err(e) => warn!(%name, error = %e, "skipping unrepresentable clickhouse event"),
        }
    }

    fn extend(&mut self, families: Vec<MetricFamily>) {
        for family in families {
            if self.names.insert(family.get_name().to_string()) {
                self.families.push(family);
            }
        }
    }

    fn into_inner(self) -> Vec<MetricFamily> {
        self.families
    }
}

/// A group of gauge vectors sharing one label schema.
struct LabeledGauges {
    vecs: Vec<GaugeVec>,
}

impl LabeledGauges {
    fn new(specs: &[(&str, &str)], labels: &[&str]) -> Self {
        let vecs = specs
            .iter()
            .filter_map(|(name, help)| {
                GaugeVec::new(Opts::new(*name, *help).namespace(NAMESPACE), labels).ok()
            })
            .collect();
        Self { vecs }
    }

    fn set(&mut self, label_values: &[&str], values: &[f64]) {
        for (vec, value) in self.vecs.iter().zip(values) {
            vec.with_label_values(label_values).set(*value);
        }
    }

    /// Families with at least one sample.
    fn collect(&self) -> Vec<MetricFamily> {
        self.vecs
            .iter()
            .flat_map(|v| v.collect())
            .filter(|f| !f.get_metric().is_empty())
            .collect()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
