use anyhow::Result;
use clap::Parser;

use logalert_core::config::LogalertConfig;
use logalert_daemon::cli::DaemonCli;
use logalert_daemon::logging;
use logalert_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = LogalertConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load {}: {}", cli.config.display(), e))?;

    // CLI flags win over file and environment
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        config = %cli.config.display(),
        version = env!("CARGO_PKG_VERSION"),
        "logalert-daemon starting"
    );

    let orchestrator = Orchestrator::build_from_config(config).await?;

    if cli.validate {
        tracing::info!(
            watchers = orchestrator.watcher_count(),
            "configuration is valid"
        );
        return Ok(());
    }

    orchestrator.run().await
}
