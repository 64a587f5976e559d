//! 설정 관리 — logalert.toml 파싱 및 런타임 설정
//!
//! [`LogalertConfig`]는 notifier, 필터, 감시 파일 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, daemon에서 적용)
//! 2. 환경변수 (`LOGALERT_GENERAL_LOG_LEVEL=debug` 형식)
//! 3. 설정 파일 (`logalert.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logalert_core::error::LogalertError> {
//! use logalert_core::config::LogalertConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogalertConfig::load("logalert.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogalertConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogalertError};

/// 감시 주기 상한 (초)
const MAX_INTERVAL_SECS: u64 = 86_400;

/// 로테이션 깊이 상한
const MAX_ROTATION_DEPTH: usize = 32;

/// logalert 통합 설정
///
/// `logalert.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogalertConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 알림 전송 수단 목록
    #[serde(default)]
    pub notifications: Vec<NotificationConfig>,
    /// 필터 목록 (파일 설정에서 이름으로 참조)
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    /// 감시 대상 파일 목록
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

impl LogalertConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogalertError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogalertError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogalertError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogalertError::Io(e)
            }
        })?;

        if metadata.is_dir() {
            return Err(ConfigError::InvalidValue {
                field: "config".to_owned(),
                reason: format!("'{}' is a directory, not a regular file", path.display()),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogalertError> {
        toml::from_str(toml_str).map_err(|e| {
            LogalertError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGALERT_{SECTION}_{FIELD}`
    /// 예: `LOGALERT_GENERAL_STATE_DIR=/tmp/logalert`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGALERT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGALERT_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.hostname, "LOGALERT_GENERAL_HOSTNAME");
        override_string(&mut self.general.state_dir, "LOGALERT_GENERAL_STATE_DIR");

        // Metrics
        override_bool(&mut self.metrics.enabled, "LOGALERT_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "LOGALERT_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "LOGALERT_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 정규식 컴파일과 버퍼 크기 해석은 watcher 생성 시점에 수행됩니다.
    pub fn validate(&self) -> Result<(), LogalertError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.general.state_dir.is_empty() {
            return Err(invalid("general.state_dir", "must not be empty"));
        }

        if self.metrics.enabled && self.metrics.endpoint != "/metrics" {
            return Err(invalid(
                "metrics.endpoint",
                "only '/metrics' is currently supported",
            ));
        }

        let mut notifier_names = HashSet::new();
        for (idx, notification) in self.notifications.iter().enumerate() {
            if notification.name.is_empty() {
                return Err(invalid(
                    format!("notifications[{idx}].name"),
                    "must not be empty",
                ));
            }
            if notification.notifier_type.is_empty() {
                return Err(invalid(
                    format!("notifications[{idx}].type"),
                    "must not be empty",
                ));
            }
            if !notifier_names.insert(notification.name.as_str()) {
                return Err(invalid(
                    format!("notifications[{idx}].name"),
                    format!("duplicate notifier name '{}'", notification.name),
                ));
            }
        }

        let mut filter_names = HashSet::new();
        for (idx, filter) in self.filters.iter().enumerate() {
            if filter.name.is_empty() {
                return Err(invalid(format!("filters[{idx}].name"), "must not be empty"));
            }
            if filter.pattern.is_empty() {
                return Err(invalid(
                    format!("filters[{idx}].pattern"),
                    "must not be empty",
                ));
            }
            if !filter_names.insert(filter.name.as_str()) {
                return Err(invalid(
                    format!("filters[{idx}].name"),
                    format!("duplicate filter name '{}'", filter.name),
                ));
            }
            for notifier in &filter.notifications {
                if !notifier_names.contains(notifier.as_str()) {
                    return Err(invalid(
                        format!("filters[{idx}].notifications"),
                        format!("unknown notifier '{notifier}'"),
                    ));
                }
            }
        }

        let mut file_names = HashSet::new();
        // 체크포인트는 경로로 식별되므로 한 경로에는 watcher 하나만 허용
        let mut file_paths = HashSet::new();
        for (idx, file) in self.files.iter().enumerate() {
            if file.path.is_empty() {
                return Err(invalid(format!("files[{idx}].path"), "must not be empty"));
            }
            if file.interval_secs == 0 || file.interval_secs > MAX_INTERVAL_SECS {
                return Err(invalid(
                    format!("files[{idx}].interval_secs"),
                    format!("must be 1-{MAX_INTERVAL_SECS}"),
                ));
            }
            if file.rotation_depth > MAX_ROTATION_DEPTH {
                return Err(invalid(
                    format!("files[{idx}].rotation_depth"),
                    format!("must be 0-{MAX_ROTATION_DEPTH}"),
                ));
            }
            if !file_names.insert(file.display_name()) {
                return Err(invalid(
                    format!("files[{idx}].name"),
                    format!("duplicate file name '{}'", file.display_name()),
                ));
            }
            let normalized: PathBuf = Path::new(&file.path).components().collect();
            if !file_paths.insert(normalized) {
                return Err(invalid(
                    format!("files[{idx}].path"),
                    format!(
                        "duplicate file path '{}': bind several filters to one entry instead",
                        file.path
                    ),
                ));
            }
            for filter in &file.filters {
                if !filter_names.contains(filter.as_str()) {
                    return Err(invalid(
                        format!("files[{idx}].filters"),
                        format!("unknown filter '{filter}'"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// 이름으로 필터 설정을 조회합니다.
    pub fn filter(&self, name: &str) -> Option<&FilterConfig> {
        self.filters.iter().find(|f| f.name == name)
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> LogalertError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 알림 템플릿의 `%hostname` 값. 비어 있으면 호스트에서 조회합니다.
    pub hostname: String,
    /// 체크포인트 파일 디렉토리
    pub state_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            hostname: String::new(),
            state_dir: "/var/lib/logalert".to_owned(),
        }
    }
}

impl GeneralConfig {
    /// 템플릿에 사용할 호스트명을 결정합니다.
    ///
    /// 설정값 → `HOSTNAME` 환경변수 → `/proc/sys/kernel/hostname` → `"localhost"` 순서입니다.
    pub fn resolve_hostname(&self) -> String {
        if !self.hostname.is_empty() {
            return self.hostname.clone();
        }
        if let Ok(name) = std::env::var("HOSTNAME") {
            if !name.trim().is_empty() {
                return name.trim().to_owned();
            }
        }
        match std::fs::read_to_string("/proc/sys/kernel/hostname") {
            Ok(name) if !name.trim().is_empty() => name.trim().to_owned(),
            _ => "localhost".to_owned(),
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리스닝 주소
    pub listen_addr: String,
    /// 리스닝 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9187,
            endpoint: "/metrics".to_owned(),
        }
    }
}

/// 알림 전송 수단 설정
///
/// `type`별 추가 키(예: 로그 레벨, 수신자)는 `options`에 그대로 보관되며
/// 각 전송 구현체가 해석합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// 고유 이름 (필터에서 참조)
    #[serde(default)]
    pub name: String,
    /// 전송 유형 태그 (예: `log`)
    #[serde(rename = "type", default)]
    pub notifier_type: String,
    /// 유형별 추가 설정
    #[serde(flatten)]
    pub options: toml::Table,
}

impl NotificationConfig {
    /// 문자열 옵션을 조회합니다.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }
}

/// 필터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// 고유 이름
    pub name: String,
    /// 매칭 정규식
    pub pattern: String,
    /// 예외 정규식 목록 (하나라도 매칭되면 제외)
    pub exceptions: Vec<String>,
    /// 본문 템플릿
    pub message: String,
    /// 제목 템플릿
    pub subject: String,
    /// 알림을 보낼 notifier 이름 목록
    pub notifications: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            pattern: String::new(),
            exceptions: Vec::new(),
            message: "%text".to_owned(),
            subject: "%filtername: %count match(es) in %filename".to_owned(),
            notifications: Vec::new(),
        }
    }
}

/// 감시 대상 파일 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// 표시 이름 (템플릿의 `%filename`). 비어 있으면 경로를 사용합니다.
    pub name: String,
    /// 파일 경로
    pub path: String,
    /// 그룹화 전에 라인에서 제거할 날짜 패턴 (비어 있으면 미사용)
    pub date_format: String,
    /// 읽기 버퍼 크기 (예: "64Kb", "1 MB")
    pub read_buffer_size: String,
    /// 폴링 주기 (초)
    pub interval_secs: u64,
    /// 추적할 로테이션 깊이 (`path.1` … `path.N`)
    pub rotation_depth: usize,
    /// 적용할 필터 이름 목록
    pub filters: Vec<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            date_format: String::new(),
            read_buffer_size: "64Kb".to_owned(),
            interval_secs: 10,
            rotation_depth: 3,
            filters: Vec::new(),
        }
    }
}

impl FileConfig {
    /// 템플릿과 로그에 사용할 이름을 반환합니다.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.path
        } else {
            &self.name
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}
