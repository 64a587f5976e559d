//! logalert.toml 통합 설정 테스트
//!
//! - logalert.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 파일 로딩 에러 테스트

use std::io::Write;

use logalert_core::config::LogalertConfig;
use logalert_core::error::{ConfigError, LogalertError};
use serial_test::serial;

// =============================================================================
// logalert.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../logalert.toml.example");
    let config = LogalertConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.state_dir, "/var/lib/logalert");
    assert_eq!(config.notifications.len(), 1);
    assert_eq!(config.filters.len(), 2);
    assert_eq!(config.files.len(), 1);
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../logalert.toml.example");
    let config = LogalertConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_file_section() {
    let content = include_str!("../../../logalert.toml.example");
    let config = LogalertConfig::parse(content).expect("should parse");

    let file = &config.files[0];
    assert_eq!(file.display_name(), "syslog");
    assert_eq!(file.read_buffer_size, "64Kb");
    assert_eq!(file.rotation_depth, 3);
    assert_eq!(file.filters, vec!["errors", "oom"]);
    assert!(!file.date_format.is_empty());
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_only_files() {
    let toml = r#"
[[filters]]
name = "panic"
pattern = "panic"

[[files]]
path = "/var/log/app.log"
filters = ["panic"]
"#;
    let config = LogalertConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.files[0].interval_secs, 10);
    assert_eq!(config.files[0].display_name(), "/var/log/app.log");
}

#[test]
fn file_without_path_fails_validation() {
    let toml = r#"
[[files]]
name = "nameless"
"#;
    let config = LogalertConfig::parse(toml).expect("should parse");
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("files[0].path"));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[tokio::test]
#[serial]
async fn load_applies_env_overrides_over_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[general]\nlog_level = \"info\"").unwrap();

    unsafe { std::env::set_var("LOGALERT_GENERAL_LOG_LEVEL", "debug") };
    let result = LogalertConfig::load(file.path()).await;
    unsafe { std::env::remove_var("LOGALERT_GENERAL_LOG_LEVEL") };

    let config = result.expect("should load");
    assert_eq!(config.general.log_level, "debug");
}

#[tokio::test]
#[serial]
async fn load_rejects_invalid_env_override() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[general]\nlog_format = \"json\"").unwrap();

    unsafe { std::env::set_var("LOGALERT_GENERAL_LOG_FORMAT", "xml") };
    let result = LogalertConfig::load(file.path()).await;
    unsafe { std::env::remove_var("LOGALERT_GENERAL_LOG_FORMAT") };

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        LogalertError::Config(ConfigError::InvalidValue { .. })
    ));
}

// =============================================================================
// 에러 테스트
// =============================================================================

#[tokio::test]
async fn load_malformed_file_returns_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[[files]\npath = ").unwrap();

    let err = LogalertConfig::load(file.path()).await.unwrap_err();
    assert!(matches!(
        err,
        LogalertError::Config(ConfigError::ParseFailed { .. })
    ));
}
