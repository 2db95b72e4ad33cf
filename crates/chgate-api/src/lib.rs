//! chgate-api — HTTP surface of the scrape gateway.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Landing page |
//! | GET | `--telemetry.endpoint` (`/metrics`) | The gateway's own process metrics |
//! | GET | `--scrape.endpoint` (`/scrape`) | `?target=host:port&module=name` per-target scrape |
//!
//! Each scrape runs `ParseRequest → ResolveModule → BuildCollector →
//! ComposeRegistry → Serialize → Respond` inside its own handler future.
//! Nothing but the read-only [`ApiState`] is shared between scrapes.

pub mod error;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use chgate_collector::CollectorFactory;
use chgate_config::ConfigStore;
use chgate_registry::{GatewayMetrics, RegistryComposer};

pub use error::{ERROR_KIND_HEADER, ScrapeError};

/// Startup options consulted by every scrape. Immutable after startup.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Path of the gateway's own metrics.
    pub telemetry_path: String,
    /// Path of the per-target scrape endpoint.
    pub scrape_path: String,
    /// Skip upstream certificate verification.
    pub insecure_tls: bool,
    /// Append the process-wide default metrics to every scrape.
    pub include_process_defaults: bool,
    /// Deadline for the collection phase of one scrape.
    pub scrape_timeout: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            telemetry_path: "/metrics".to_string(),
            scrape_path: "/scrape".to_string(),
            insecure_tls: false,
            include_process_defaults: false,
            scrape_timeout: Duration::from_secs(10),
        }
    }
}

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<ConfigStore>,
    pub factory: Arc<dyn CollectorFactory>,
    pub composer: RegistryComposer,
    pub metrics: GatewayMetrics,
    pub options: Arc<GatewayOptions>,
}

/// Build the gateway router.
pub fn build_router(state: ApiState) -> Router {
    let telemetry_path = state.options.telemetry_path.clone();
    let scrape_path = state.options.scrape_path.clone();

    Router::new()
        .route("/", get(handlers::landing_page))
        .route(&telemetry_path, get(handlers::telemetry_metrics))
        .route(&scrape_path, get(handlers::scrape))
        .with_state(state)
}
