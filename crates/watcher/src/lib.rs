#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`buffer`]: 읽기 버퍼 크기 해석
//! - [`checkpoint`]: 파일 식별자와 체크포인트 저장소
//! - [`rotation`]: 로테이션 체인 탐색
//! - [`reader`]: 버퍼 경계와 로테이션을 넘는 라인 읽기
//! - [`filter`]: 필터 컴파일과 템플릿 렌더링
//! - [`matcher`]: 날짜 제거와 폴링 주기 내 집계
//! - [`message`]: 집계된 알림 이벤트
//! - [`dispatcher`]: notifier 레지스트리와 전송
//! - [`watcher`]: 폴링 루프와 상태 머신
//! - [`supervisor`]: watcher 구성과 동시 실행
//! - [`config`]: 감시 대상 설정 (core 설정 변환)
//! - [`error`]: 도메인 에러 타입

pub mod buffer;
pub mod checkpoint;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod message;
pub mod reader;
pub mod rotation;
pub mod supervisor;
pub mod watcher;

// --- 주요 타입 re-export ---

// 실행
pub use supervisor::{build_watchers, run_watchers};
pub use watcher::{Persist, TailState, Watcher, WatcherPhase};

// 설정
pub use config::{WatchTarget, WatchTargetBuilder};

// 에러
pub use error::WatcherError;

// 매칭
pub use filter::{Filter, FilterSet};
pub use matcher::{DateStripper, aggregate};
pub use message::Message;

// 읽기
pub use checkpoint::{Checkpoint, CheckpointStore, FileIdentity};
pub use reader::{LineReader, ReadOutcome};
pub use rotation::RotationChain;

// 전송
pub use dispatcher::Dispatcher;
