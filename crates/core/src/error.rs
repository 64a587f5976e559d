//! 에러 타입 — 도메인별 에러 정의

/// logalert 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogalertError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 알림 전송 에러
    #[error("notifier error: {0}")]
    Notifier(#[from] NotifierError),

    /// 로그 감시(watcher) 에러
    #[error("watcher error: {0}")]
    Watcher(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 알림 전송(transport) 에러
///
/// 전송 구현체는 자신의 실패 원인을 `reason`에 담아 반환합니다.
/// 코어는 이 에러를 재시도하지 않고 현재 폴링 단계를 중단합니다.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// 전송 실패
    #[error("notifier '{notifier}' send failed: {reason}")]
    SendFailed { notifier: String, reason: String },

    /// 이미 닫힌 notifier로 전송 시도
    #[error("notifier '{0}' is closed")]
    Closed(String),

    /// 지원하지 않는 notifier 유형
    #[error("unsupported notifier type: {0}")]
    UnsupportedType(String),
}
