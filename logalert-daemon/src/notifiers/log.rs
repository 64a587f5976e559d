//! Built-in `log` transport.
//!
//! Emits each alert as a tracing event on the `logalert::alert` target,
//! so alerts land wherever the daemon's own logs go (journald, a JSON
//! collector, a terminal).
//!
//! ```toml
//! [[notifications]]
//! name = "journal"
//! type = "log"
//! level = "warn"   # trace | debug | info | warn | error
//! ```

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::Level;

use logalert_core::config::NotificationConfig;
use logalert_core::error::NotifierError;
use logalert_core::notifier::Notifier;

/// Type tag matched against `[[notifications]].type`.
pub const NOTIFIER_TYPE: &str = "log";

/// Level used when the entry has no `level` key.
const DEFAULT_LEVEL: Level = Level::WARN;

/// Notifier that writes alerts to the tracing subscriber.
pub struct LogNotifier {
    name: String,
    level: Level,
    closed: AtomicBool,
}

impl LogNotifier {
    /// Create a notifier emitting at `level`.
    pub fn new(name: impl Into<String>, level: Level) -> Self {
        Self {
            name: name.into(),
            level,
            closed: AtomicBool::new(false),
        }
    }

    /// Build from a `[[notifications]]` entry.
    pub fn from_config(config: &NotificationConfig) -> Result<Self> {
        let level = match config.option_str("level") {
            Some(raw) => Level::from_str(raw).map_err(|_| {
                anyhow::anyhow!(
                    "invalid level '{}', expected one of trace, debug, info, warn, error",
                    raw
                )
            })?,
            None => DEFAULT_LEVEL,
        };
        Ok(Self::new(config.name.clone(), level))
    }

    /// Level alerts are emitted at.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn notifier_type(&self) -> &str {
        NOTIFIER_TYPE
    }

    async fn send(&self, subject: &str, text: &str) -> Result<(), NotifierError> {
        if self.is_closed() {
            return Err(NotifierError::Closed(self.name.clone()));
        }

        // tracing macros need the level at compile time
        match self.level {
            Level::ERROR => {
                tracing::error!(target: "logalert::alert", notifier = %self.name, subject, text)
            }
            Level::WARN => {
                tracing::warn!(target: "logalert::alert", notifier = %self.name, subject, text)
            }
            Level::INFO => {
                tracing::info!(target: "logalert::alert", notifier = %self.name, subject, text)
            }
            Level::DEBUG => {
                tracing::debug!(target: "logalert::alert", notifier = %self.name, subject, text)
            }
            _ => tracing::trace!(target: "logalert::alert", notifier = %self.name, subject, text),
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), NotifierError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(notifier = %self.name, "log notifier closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_level(level: Option<&str>) -> NotificationConfig {
        let mut options = toml::Table::new();
        if let Some(level) = level {
            options.insert("level".to_owned(), toml::Value::String(level.to_owned()));
        }
        NotificationConfig {
            name: "journal".to_owned(),
            notifier_type: NOTIFIER_TYPE.to_owned(),
            options,
        }
    }

    #[test]
    fn level_defaults_to_warn() {
        let notifier = LogNotifier::from_config(&config_with_level(None)).unwrap();
        assert_eq!(notifier.level(), Level::WARN);
        assert_eq!(Notifier::name(&notifier), "journal");
        assert_eq!(Notifier::notifier_type(&notifier), "log");
    }

    #[test]
    fn level_is_case_insensitive() {
        let notifier = LogNotifier::from_config(&config_with_level(Some("ERROR"))).unwrap();
        assert_eq!(notifier.level(), Level::ERROR);
    }

    #[test]
    fn invalid_level_is_rejected() {
        assert!(LogNotifier::from_config(&config_with_level(Some("loud"))).is_err());
    }

    #[tokio::test]
    async fn send_succeeds_until_closed() {
        let notifier = LogNotifier::new("journal", Level::INFO);
        notifier.send("errors: 1 match(es)", "disk full").await.unwrap();

        notifier.close().await.unwrap();
        notifier.close().await.unwrap();
        assert!(notifier.is_closed());

        let err = notifier.send("late", "text").await.unwrap_err();
        assert!(matches!(err, NotifierError::Closed(name) if name == "journal"));
    }
}
