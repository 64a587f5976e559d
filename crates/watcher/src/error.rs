//! watcher 에러 타입
//!
//! [`WatcherError`]는 파일 감시, 매칭, 디스패치 중 발생하는 모든 에러를 표현합니다.
//! `From<WatcherError> for LogalertError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.
//!
//! 폴링 단계의 에러는 [`WatcherError::is_fatal`]로 분류됩니다.
//! 치명적 에러는 해당 watcher를 종료시키고, 나머지는 다음 틱에서 재시도됩니다.

use logalert_core::error::{LogalertError, NotifierError};

/// watcher 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    /// 읽기 버퍼 크기 해석 실패
    #[error("invalid read buffer size: '{0}'")]
    InvalidBufferSize(String),

    /// 필터 또는 날짜 패턴 정규식 오류
    #[error("invalid pattern in '{filter}': {reason}")]
    InvalidPattern {
        /// 필터 이름 (날짜 패턴이면 파일 이름)
        filter: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 값 오류
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 설정이 존재하지 않는 필터를 참조
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// 필터가 등록되지 않은 notifier를 참조
    #[error("unknown notifier: {0}")]
    UnknownNotifier(String),

    /// 같은 이름의 notifier가 이미 등록됨
    #[error("notifier already registered: {0}")]
    DuplicateNotifier(String),

    /// device/inode 식별을 지원하지 않는 플랫폼
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// 체크포인트 로드/저장 실패
    #[error("checkpoint error: {path}: {reason}")]
    Checkpoint {
        /// 체크포인트 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 추적 중이던 물리 파일을 로테이션 체인에서 찾지 못함
    #[error("rotation lost: tracked file for '{path}' not found within rotation depth")]
    RotationLost {
        /// 감시 경로
        path: String,
    },

    /// 파일 읽기 실패
    #[error("read error: {path}: {source}")]
    Read {
        /// 읽던 파일 경로
        path: String,
        /// 원인 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// 알림 전송 실패
    #[error("dispatch to '{notifier}' failed: {source}")]
    Dispatch {
        /// notifier 이름
        notifier: String,
        /// 원인 전송 에러
        #[source]
        source: NotifierError,
    },

    /// 블로킹 태스크 실패 (panic, lock poisoning)
    #[error("task error: {0}")]
    Task(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatcherError {
    /// watcher를 종료시켜야 하는 에러인지 여부를 반환합니다.
    ///
    /// 로테이션 추적 상실, 체크포인트 저장 실패, 태스크 실패는 치명적입니다.
    /// 읽기와 디스패치 실패는 체크포인트가 전진하지 않으므로 다음 틱에서 재시도됩니다.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Read { .. } | Self::Io(_) | Self::Dispatch { .. } => false,
            Self::RotationLost { .. } | Self::Checkpoint { .. } | Self::Task(_) => true,
            // 구성 단계 에러가 폴링 중에 나타나면 복구할 수 없음
            Self::InvalidBufferSize(_)
            | Self::InvalidPattern { .. }
            | Self::Config { .. }
            | Self::UnknownFilter(_)
            | Self::UnknownNotifier(_)
            | Self::DuplicateNotifier(_)
            | Self::UnsupportedPlatform(_) => true,
        }
    }
}

impl From<WatcherError> for LogalertError {
    fn from(err: WatcherError) -> Self {
        match err {
            WatcherError::Dispatch { source, .. } => LogalertError::Notifier(source),
            other => LogalertError::Watcher(other.to_string()),
        }
    }
}
