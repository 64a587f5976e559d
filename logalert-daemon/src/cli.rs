//! CLI argument definitions for logalert-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Log tailing and alerting daemon.
///
/// Follows the configured log files through rotation, matches new lines
/// against filters and forwards grouped alerts to notifiers.
#[derive(Parser, Debug)]
#[command(name = "logalert-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logalert.toml configuration file.
    #[arg(short, long, default_value = "/etc/logalert/logalert.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration, build every watcher, then exit without polling.
    #[arg(long)]
    pub validate: bool,
}
