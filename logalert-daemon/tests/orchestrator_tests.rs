//! Orchestrator integration tests.
//!
//! Tests the full flow: config loading -> notifier/watcher build -> run -> shutdown.

#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use logalert_core::config::LogalertConfig;
use logalert_daemon::orchestrator::Orchestrator;
use logalert_watcher::CheckpointStore;
use tokio::time::{sleep, timeout};

/// TOML watching a single file with an `errors` filter routed to a log notifier.
fn single_file_toml(state_dir: &Path, log_path: &Path) -> String {
    format!(
        r#"
[general]
log_level = "info"
hostname = "test-host"
state_dir = '{}'

[[notifications]]
name = "journal"
type = "log"
level = "info"

[[filters]]
name = "errors"
pattern = "ERROR"
notifications = ["journal"]

[[files]]
name = "app"
path = '{}'
interval_secs = 1
filters = ["errors"]
"#,
        state_dir.display(),
        log_path.display()
    )
}

fn single_file_config(state_dir: &Path, log_path: &Path) -> LogalertConfig {
    LogalertConfig::parse(&single_file_toml(state_dir, log_path))
        .expect("failed to parse test config")
}

async fn wait_for_offset(store: &CheckpointStore, offset: u64) {
    loop {
        if let Ok(Some(checkpoint)) = store.load().await {
            if checkpoint.offset == offset {
                return;
            }
        }
        sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_build_with_no_files_and_clean_shutdown() {
    let state = tempfile::tempdir().unwrap();
    let mut config = LogalertConfig::default();
    config.general.state_dir = state.path().display().to_string();

    let orchestrator = Orchestrator::build_from_config(config).await.unwrap();
    assert_eq!(orchestrator.watcher_count(), 0);

    timeout(Duration::from_secs(5), orchestrator.run_until(async {}))
        .await
        .expect("shutdown timed out")
        .expect("clean shutdown should succeed");
}

#[tokio::test]
async fn test_build_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("app.log");
    std::fs::write(&log_path, b"").unwrap();

    let config_path = dir.path().join("logalert.toml");
    std::fs::write(
        &config_path,
        single_file_toml(&dir.path().join("state"), &log_path),
    )
    .unwrap();

    let orchestrator = Orchestrator::build(&config_path).await.unwrap();
    assert_eq!(orchestrator.watcher_count(), 1);
    assert_eq!(orchestrator.hostname(), "test-host");
    assert_eq!(orchestrator.config().files[0].name, "app");
}

#[tokio::test]
async fn test_build_fails_for_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Orchestrator::build(&dir.path().join("missing.toml")).await;
    let err = result.err().expect("missing config should fail");
    assert!(err.to_string().contains("failed to load config"));
}

#[tokio::test]
async fn test_build_rejects_unsupported_notifier_type() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("app.log");
    std::fs::write(&log_path, b"").unwrap();

    let mut config = single_file_config(&dir.path().join("state"), &log_path);
    config.notifications[0].notifier_type = "carrier-pigeon".to_owned();

    let err = Orchestrator::build_from_config(config).await.err().unwrap();
    assert!(err.to_string().contains("carrier-pigeon"), "{err}");
}

#[tokio::test]
async fn test_build_rejects_invalid_filter_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("app.log");
    std::fs::write(&log_path, b"").unwrap();

    let mut config = single_file_config(&dir.path().join("state"), &log_path);
    config.filters[0].pattern = "(unclosed".to_owned();

    let err = Orchestrator::build_from_config(config).await.err().unwrap();
    assert!(err.to_string().contains("failed to build watchers"), "{err}");
}

#[tokio::test]
async fn test_build_rejects_missing_watched_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = single_file_config(&dir.path().join("state"), &dir.path().join("absent.log"));

    assert!(Orchestrator::build_from_config(config).await.is_err());
}

#[tokio::test]
async fn test_run_dispatches_and_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join("state");
    let log_path = dir.path().join("app.log");
    std::fs::write(&log_path, b"INFO fine\nERROR boom\n").unwrap();

    let config = single_file_config(&state_dir, &log_path);
    let orchestrator = Orchestrator::build_from_config(config).await.unwrap();

    let store = CheckpointStore::new(&state_dir, &log_path);
    assert_eq!(store.load().await.unwrap().unwrap().offset, 0);

    let watched = store.clone();
    timeout(
        Duration::from_secs(10),
        orchestrator.run_until(async move { wait_for_offset(&watched, 21).await }),
    )
    .await
    .expect("checkpoint never advanced")
    .expect("daemon should stop cleanly");

    assert_eq!(store.load().await.unwrap().unwrap().offset, 21);
}

#[tokio::test]
async fn test_external_cancel_stops_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("app.log");
    std::fs::write(&log_path, b"").unwrap();

    let config = single_file_config(&dir.path().join("state"), &log_path);
    let orchestrator = Orchestrator::build_from_config(config).await.unwrap();
    let token = orchestrator.shutdown_token();

    let handle = tokio::spawn(orchestrator.run_until(std::future::pending()));
    sleep(Duration::from_millis(100)).await;
    token.cancel();

    let result = timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
    assert!(result.is_ok(), "{result:?}");
}

#[tokio::test]
async fn test_fatal_watcher_error_stops_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("app.log");
    std::fs::write(&log_path, b"ERROR before\n").unwrap();

    let config = single_file_config(&dir.path().join("state"), &log_path);
    let orchestrator = Orchestrator::build_from_config(config).await.unwrap();

    // file and every rotated sibling gone: the watcher cannot continue
    std::fs::remove_file(&log_path).unwrap();

    let result = timeout(
        Duration::from_secs(5),
        orchestrator.run_until(std::future::pending()),
    )
    .await
    .expect("daemon kept running after a fatal watcher error");

    let err = result.unwrap_err();
    assert!(err.to_string().contains("watcher failed"), "{err}");
}
