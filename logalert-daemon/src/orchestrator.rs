//! Watcher orchestration -- assembly, lifecycle management and shutdown.
//!
//! The [`Orchestrator`] is the central coordinator of `logalert-daemon`.
//! It validates configuration, builds the notifier dispatcher and one
//! watcher per `[[files]]` entry, then runs them until a shutdown signal
//! arrives or a watcher stops on a fatal error.
//!
//! # Shutdown
//!
//! 1. The shared cancellation token is cancelled (signal or fatal watcher)
//! 2. Every watcher finishes its current step and returns
//! 3. All notifiers are closed
//! 4. The first watcher error, if any, becomes the daemon's exit error

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use logalert_core::config::LogalertConfig;
use logalert_watcher::{Dispatcher, Watcher, build_watchers, run_watchers};

use crate::metrics_server;
use crate::notifiers;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: LogalertConfig,
    /// Hostname substituted into alert templates.
    hostname: String,
    /// Notifier registry shared with every watcher.
    dispatcher: Arc<Dispatcher>,
    /// One watcher per watched file, not yet running.
    watchers: Vec<Watcher>,
    /// Cancelled on shutdown; watchers cancel it themselves on fatal errors.
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read, parsed or validated
    /// - A notifier, filter or watcher cannot be built
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = LogalertConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    ///
    /// Building a watcher restores (or creates) its checkpoint, so this
    /// touches `general.state_dir` even when the daemon never polls.
    pub async fn build_from_config(config: LogalertConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let hostname = config.general.resolve_hostname();
        tracing::debug!(hostname = %hostname, "resolved template hostname");

        let dispatcher = Arc::new(notifiers::build_dispatcher(&config.notifications)?);
        tracing::info!(count = dispatcher.len(), "notifiers initialized");

        let watchers = build_watchers(&config, &hostname, Arc::clone(&dispatcher))
            .await
            .map_err(|e| anyhow::anyhow!("failed to build watchers: {}", e))?;
        tracing::info!(count = watchers.len(), "watchers initialized");

        Ok(Self {
            config,
            hostname,
            dispatcher,
            watchers,
            cancel: CancellationToken::new(),
        })
    }

    /// Run until SIGTERM/SIGINT or a fatal watcher error.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            match wait_for_shutdown_signal().await {
                Ok(signal) => tracing::info!(signal, "received shutdown signal"),
                Err(e) => tracing::error!(error = %e, "signal handling failed, shutting down"),
            }
        })
        .await
    }

    /// Run until `shutdown` completes or a fatal watcher error.
    ///
    /// Returns `Ok(())` after a clean shutdown and the first watcher's
    /// error if any watcher stopped on its own.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            dispatcher,
            watchers,
            cancel,
            ..
        } = self;

        tracing::info!(watchers = watchers.len(), "logalert-daemon running");
        let supervisor = tokio::spawn(run_watchers(watchers, cancel.clone()));

        tokio::select! {
            () = shutdown => {}
            () = cancel.cancelled() => {
                tracing::warn!("shutdown token cancelled, stopping watchers");
            }
        }
        cancel.cancel();

        let result = supervisor
            .await
            .map_err(|e| anyhow::anyhow!("watcher supervisor task failed: {}", e))?;

        dispatcher.close_all().await;
        tracing::info!("logalert-daemon stopped");

        result.map_err(|e| anyhow::anyhow!("watcher failed: {}", e))
    }

    /// Token cancelled on shutdown.
    ///
    /// Cancelling it from outside stops the daemon like a signal would.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of watchers that will run.
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Hostname used in alert templates.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &LogalertConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to listen for Ctrl-C: {}", e))?;
    Ok("Ctrl-C")
}
