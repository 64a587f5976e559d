//! logalert 공통 크레이트
//!
//! 모든 logalert 크레이트가 공유하는 설정, 에러 타입, 알림 전송 trait,
//! 메트릭 상수를 제공합니다.
//!
//! - [`config`] — `logalert.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`error`] — 도메인별 에러 타입
//! - [`notifier`] — 전송 수단 trait ([`Notifier`], [`DynNotifier`])
//! - [`metrics`] — Prometheus 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod notifier;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogalertError, NotifierError};

// 설정
pub use config::{FileConfig, FilterConfig, GeneralConfig, LogalertConfig, NotificationConfig};

// 알림 전송
pub use notifier::{BoxFuture, DynNotifier, Notifier};
