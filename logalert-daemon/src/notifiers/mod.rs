//! Notifier construction.
//!
//! Turns each `[[notifications]]` entry into a transport and registers it
//! with a [`Dispatcher`]. The daemon ships a single built-in transport,
//! [`LogNotifier`], which forwards alerts into the process's own tracing
//! output. Other transports plug in by implementing
//! [`logalert_core::Notifier`] and adding an arm to [`build_notifier`].

pub mod log;

use std::sync::Arc;

use anyhow::Result;

use logalert_core::config::NotificationConfig;
use logalert_core::error::NotifierError;
use logalert_core::notifier::DynNotifier;
use logalert_watcher::Dispatcher;

pub use self::log::LogNotifier;

/// Build a single notifier from its configuration entry.
///
/// # Errors
///
/// - `type` names a transport this build does not provide
/// - Transport-specific options are invalid
pub fn build_notifier(config: &NotificationConfig) -> Result<Arc<dyn DynNotifier>> {
    match config.notifier_type.as_str() {
        log::NOTIFIER_TYPE => Ok(Arc::new(LogNotifier::from_config(config)?)),
        other => Err(NotifierError::UnsupportedType(other.to_owned()).into()),
    }
}

/// Build a dispatcher holding every configured notifier.
///
/// Names must be unique; a repeated name is rejected by the dispatcher.
pub fn build_dispatcher(configs: &[NotificationConfig]) -> Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new();
    for config in configs {
        let notifier = build_notifier(config)
            .map_err(|e| anyhow::anyhow!("failed to build notifier '{}': {}", config.name, e))?;
        dispatcher
            .register(notifier)
            .map_err(|e| anyhow::anyhow!("failed to register notifier '{}': {}", config.name, e))?;
        tracing::debug!(
            notifier = %config.name,
            notifier_type = %config.notifier_type,
            "notifier registered"
        );
    }
    Ok(dispatcher)
}
