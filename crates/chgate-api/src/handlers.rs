//! Route handlers.

use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chgate_registry::exposition;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::ApiState;

/// Query string of the scrape endpoint. Empty values count as absent.
#[derive(Debug, Default)]
pub struct ScrapeParams {
    pub target: Option<String>,
    pub module: Option<String>,
}

impl ScrapeParams {
    /// Pick `target` and `module` from raw query pairs. When a key repeats,
    /// the first occurrence wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "target" => &mut params.target,
                "module" => &mut params.module,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

// ── Scrape ─────────────────────────────────────────────────────

/// GET {scrape_path}?target=host:port&module=name
pub async fn scrape(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let started = Instant::now();
    let mut module = None;

    let params = ScrapeParams::from_pairs(pairs);
    let result = run_scrape(&state, params, &mut module).await;
    let elapsed = started.elapsed();

    match result {
        Ok(body) => {
            state.metrics.observe(module.as_deref(), "success", elapsed);
            debug!(
                module = module.as_deref().unwrap_or(""),
                bytes = body.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "scrape served"
            );
            (
                StatusCode::OK,
                [("content-type", exposition::CONTENT_TYPE)],
                body,
            )
                .into_response()
        }
        Err(e) => {
            state.metrics.observe(module.as_deref(), e.outcome(), elapsed);
            warn!(
                kind = e.kind(),
                module = module.as_deref().unwrap_or(""),
                error = %e,
                "scrape failed"
            );
            e.into_response()
        }
    }
}

/// The per-request pipeline. `module` is set once the name has resolved.
async fn run_scrape(
    state: &ApiState,
    params: ScrapeParams,
    module: &mut Option<String>,
) -> Result<Vec<u8>, ScrapeError> {
    // ParseRequest: both parameters before touching anything else.
    let target = params
        .target
        .filter(|t| !t.is_empty())
        .ok_or(ScrapeError::MissingParameter("target"))?;
    let module_name = params
        .module
        .filter(|m| !m.is_empty())
        .ok_or(ScrapeError::MissingParameter("module"))?;

    // ResolveModule
    let config = state.config.load()?;
    let credentials = config.resolve(&module_name)?;
    *module = Some(module_name);

    // BuildCollector
    let collector = state
        .factory
        .build(&target, credentials, state.options.insecure_tls)?;
    info!(
        target = %collector.target(),
        module = module.as_deref().unwrap_or(""),
        "Scraping"
    );

    // ComposeRegistry
    let mut registry = state
        .composer
        .compose(collector, state.options.include_process_defaults)?;

    // Serialize
    let timeout = state.options.scrape_timeout;
    let families = tokio::time::timeout(timeout, registry.gather())
        .await
        .map_err(|_| ScrapeError::CollectionTimeout(timeout))??;
    Ok(exposition::encode(&families)?)
}

// ── Telemetry ──────────────────────────────────────────────────

/// GET {telemetry_path}
pub async fn telemetry_metrics(State(state): State<ApiState>) -> Response {
    let families = state.composer.process_defaults().gather();
    match exposition::encode(&families) {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", exposition::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => ScrapeError::Encode(e).into_response(),
    }
}

// ── Landing page ───────────────────────────────────────────────

/// GET /
pub async fn landing_page(State(state): State<ApiState>) -> Html<String> {
    Html(format!(
        r#"<html>
<head><title>ClickHouse Exporter</title></head>
<body>
<h1>ClickHouse Exporter</h1>
<p><a href="{telemetry}">Metrics</a></p>
<p>Scrape a server: <code>{scrape}?target=host:port&amp;module=name</code></p>
</body>
</html>
"#,
        telemetry = state.options.telemetry_path,
        scrape = state.options.scrape_path,
    ))
}
