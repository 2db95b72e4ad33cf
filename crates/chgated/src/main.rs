//! chgated — the ClickHouse metrics gateway daemon.
//!
//! Serves per-target scrapes: Prometheus asks for
//! `/scrape?target=host:port&module=name`, the gateway resolves the module's
//! credentials from `conf/conf.yml`, queries that ClickHouse server and
//! answers in the text exposition format.
//!
//! # Usage
//!
//! ```text
//! chgated --telemetry.address :9116 --scrape_uri https://localhost:8443/
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use chgate_api::{ApiState, GatewayOptions};
use chgate_collector::ClickHouseCollectorFactory;
use chgate_config::{ConfigStore, DEFAULT_CONFIG_PATH};
use chgate_registry::{GatewayMetrics, RegistryComposer};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "chgated", about = "ClickHouse metrics gateway for Prometheus")]
struct Cli {
    /// Address to listen on. A leading ':' listens on all interfaces.
    #[arg(long = "telemetry.address", default_value = ":9116")]
    telemetry_address: String,

    /// Path under which the gateway's own metrics are exposed.
    #[arg(long = "telemetry.endpoint", default_value = "/metrics")]
    telemetry_endpoint: String,

    /// Path of the per-target scrape endpoint.
    #[arg(long = "scrape.endpoint", default_value = "/scrape")]
    scrape_endpoint: String,

    /// Template URI; its scheme and path are used for every target.
    #[arg(long = "scrape_uri", default_value = "http://localhost:8123/")]
    scrape_uri: String,

    /// Expose only ClickHouse metrics, not the gateway's own.
    #[arg(long = "clickhouse_only", default_value_t = true, action = ArgAction::Set)]
    clickhouse_only: bool,

    /// Skip server certificate verification.
    #[arg(long = "insecure")]
    insecure: bool,

    /// Deadline for collecting one target, in seconds.
    #[arg(
        long = "scrape.timeout-secs",
        default_value = "10",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    scrape_timeout_secs: u64,

    /// Module credentials file.
    #[arg(long = "config.file", default_value = DEFAULT_CONFIG_PATH)]
    config_file: PathBuf,

    /// Re-read the module file only when its modification time changes.
    #[arg(long = "config.cache")]
    config_cache: bool,

    /// Log output format.
    #[arg(long = "log.format", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    run(cli).await
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,chgated=debug,chgate=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("clickhouse metrics gateway for Prometheus monitoring");

    let addr = parse_listen_address(&cli.telemetry_address)?;
    validate_paths(&cli.telemetry_endpoint, &cli.scrape_endpoint)?;
    warn_ignored_env_credentials();
    if cli.insecure {
        warn!("TLS certificate verification disabled for all targets");
    }

    // ── Collaborators ──────────────────────────────────────────

    let factory = ClickHouseCollectorFactory::new(&cli.scrape_uri)
        .with_context(|| format!("invalid --scrape_uri {:?}", cli.scrape_uri))?;
    info!(scrape_uri = %cli.scrape_uri, "collector factory initialized");

    let process_defaults = prometheus::default_registry().clone();
    let metrics = GatewayMetrics::register(&process_defaults)
        .context("registering gateway metrics")?;
    let composer = RegistryComposer::new(process_defaults);

    let mut config = ConfigStore::new(cli.config_file.clone());
    if cli.config_cache {
        config = config.with_mtime_cache();
    }
    info!(
        path = %cli.config_file.display(),
        cache = cli.config_cache,
        "module configuration"
    );

    let options = GatewayOptions {
        telemetry_path: cli.telemetry_endpoint,
        scrape_path: cli.scrape_endpoint,
        insecure_tls: cli.insecure,
        include_process_defaults: !cli.clickhouse_only,
        scrape_timeout: Duration::from_secs(cli.scrape_timeout_secs),
    };

    let state = ApiState {
        config: Arc::new(config),
        factory: Arc::new(factory),
        composer,
        metrics,
        options: Arc::new(options),
    };

    // ── Start server ───────────────────────────────────────────

    let router = chgate_api::build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("chgated stopped");
    Ok(())
}

/// Parse a listen address; `:port` binds every interface.
fn parse_listen_address(raw: &str) -> anyhow::Result<SocketAddr> {
    let full = match raw.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => raw.to_string(),
    };
    full.parse()
        .with_context(|| format!("invalid --telemetry.address {raw:?}"))
}

fn validate_paths(telemetry: &str, scrape: &str) -> anyhow::Result<()> {
    for path in [telemetry, scrape] {
        if !path.starts_with('/') || path == "/" {
            bail!("endpoint path {path:?} must start with '/' and not be the root");
        }
    }
    if telemetry == scrape {
        bail!("--telemetry.endpoint and --scrape.endpoint must differ (both {telemetry:?})");
    }
    Ok(())
}

/// The env credentials are read but never used for resolution.
fn warn_ignored_env_credentials() {
    for var in ["CLICKHOUSE_USER", "CLICKHOUSE_PASSWORD"] {
        if std::env::var_os(var).is_some() {
            warn!(var, "environment credentials are ignored; use the module file");
        }
    }
}
