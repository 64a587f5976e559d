//! Scrape endpoint for the per-file watcher counters.
//!
//! Every counter in `logalert_core::metrics` carries a `file` label with the
//! watched entry's name, so one scrape shows lines read, events matched,
//! dispatch and read failures, and checkpoint writes for each log. Nothing
//! is recorded until [`install_metrics_recorder`] runs; before that the
//! `metrics` macros in the watcher are no-ops.

use std::net::SocketAddr;

use anyhow::Result;
use logalert_core::config::MetricsConfig;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Path served by the exporter's built-in listener.
const SCRAPE_PATH: &str = "/metrics";

/// Resolve `[metrics]` into the socket the exporter binds.
///
/// # Errors
///
/// Fails when `endpoint` is not `/metrics` (the exporter serves a fixed
/// path) or when `listen_addr:port` is not a socket address.
pub fn scrape_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    if config.endpoint != SCRAPE_PATH {
        anyhow::bail!(
            "unsupported metrics endpoint '{}': the exporter only serves '{}'",
            config.endpoint,
            SCRAPE_PATH
        );
    }

    format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {}", e))
}

/// Bind the scrape listener and make it the process-wide recorder.
///
/// Call before the watchers are built so the first poll is counted.
/// A second call in the same process fails.
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    let addr = scrape_addr(config)?;

    if addr.ip().is_unspecified() {
        // file labels leak watched log names
        tracing::warn!(listen_addr = %addr, "watcher metrics exposed on all interfaces");
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    logalert_core::metrics::describe_all();

    tracing::info!(
        listen_addr = %addr,
        counters = logalert_core::metrics::ALL_METRIC_NAMES.len(),
        "watcher metrics available"
    );
    Ok(())
}
