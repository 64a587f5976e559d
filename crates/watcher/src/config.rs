//! 감시 대상 설정
//!
//! [`WatchTarget`]은 core의 [`FileConfig`](logalert_core::config::FileConfig)를
//! 실행 가능한 형태(바이트 단위 버퍼 크기, `Duration` 주기, 컴파일된 필터)로 변환한 것입니다.
//! watcher 생성 후에는 변경되지 않습니다.
//!
//! # 사용 예시
//! ```ignore
//! use logalert_core::config::LogalertConfig;
//! use logalert_watcher::{FilterSet, WatchTarget};
//!
//! let core = LogalertConfig::default();
//! let filters = FilterSet::from_config(&core.filters, "web-01")?;
//! let targets = core
//!     .files
//!     .iter()
//!     .map(|f| WatchTarget::from_core(f, &filters))
//!     .collect::<Result<Vec<_>, _>>()?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use logalert_core::config::FileConfig;

use crate::buffer::{MAX_BUFFER_SIZE, MIN_BUFFER_SIZE, parse_buffer_size};
use crate::error::WatcherError;
use crate::filter::{Filter, FilterSet};
use crate::rotation::DEFAULT_ROTATION_DEPTH;

/// 감시 대상 파일 하나
#[derive(Debug, Clone)]
pub struct WatchTarget {
    /// 표시 이름 (`%filename`, 로그, 메트릭 레이블)
    pub name: String,
    /// 감시 경로
    pub path: PathBuf,
    /// 읽기 버퍼 크기 (바이트)
    pub buffer_size: usize,
    /// 폴링 주기
    pub interval: Duration,
    /// 날짜 제거 패턴
    pub date_format: Option<String>,
    /// 로테이션 추적 깊이
    pub rotation_depth: usize,
    /// 적용할 필터 (설정 순서)
    pub filters: Vec<Arc<Filter>>,
}

impl WatchTarget {
    /// core 파일 설정과 컴파일된 필터 집합으로 감시 대상을 만듭니다.
    ///
    /// 버퍼 크기 해석 실패나 알 수 없는 필터 이름은 에러입니다.
    pub fn from_core(file: &FileConfig, filters: &FilterSet) -> Result<Self, WatcherError> {
        let buffer_size = parse_buffer_size(&file.read_buffer_size)
            .ok_or_else(|| WatcherError::InvalidBufferSize(file.read_buffer_size.clone()))?;

        let filters = file
            .filters
            .iter()
            .map(|name| filters.get(name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: file.display_name().to_owned(),
            path: PathBuf::from(&file.path),
            buffer_size,
            interval: Duration::from_secs(file.interval_secs),
            date_format: (!file.date_format.is_empty()).then(|| file.date_format.clone()),
            rotation_depth: file.rotation_depth,
            filters,
        })
    }

    /// 빌더를 생성합니다.
    pub fn builder(path: impl Into<PathBuf>) -> WatchTargetBuilder {
        WatchTargetBuilder::new(path)
    }

    /// 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), WatcherError> {
        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(WatcherError::InvalidBufferSize(format!(
                "{} bytes (must be {MIN_BUFFER_SIZE}-{MAX_BUFFER_SIZE})",
                self.buffer_size
            )));
        }
        if self.interval.is_zero() {
            return Err(WatcherError::Config {
                field: "interval".to_owned(),
                reason: format!("poll interval for '{}' must be positive", self.name),
            });
        }
        Ok(())
    }
}

/// 감시 대상 빌더
///
/// 테스트와 임베딩 용도로 설정 파일 없이 [`WatchTarget`]을 만듭니다.
pub struct WatchTargetBuilder {
    target: WatchTarget,
}

impl WatchTargetBuilder {
    /// 경로로 새 빌더를 생성합니다. 이름은 경로로 초기화됩니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            target: WatchTarget {
                name: path.display().to_string(),
                path,
                buffer_size: 64 * 1024,
                interval: Duration::from_secs(10),
                date_format: None,
                rotation_depth: DEFAULT_ROTATION_DEPTH,
                filters: Vec::new(),
            },
        }
    }

    /// 표시 이름을 설정합니다.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.target.name = name.into();
        self
    }

    /// 읽기 버퍼 크기(바이트)를 설정합니다.
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.target.buffer_size = bytes;
        self
    }

    /// 폴링 주기를 설정합니다.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.target.interval = interval;
        self
    }

    /// 날짜 제거 패턴을 설정합니다.
    pub fn date_format(mut self, pattern: impl Into<String>) -> Self {
        self.target.date_format = Some(pattern.into());
        self
    }

    /// 로테이션 추적 깊이를 설정합니다.
    pub fn rotation_depth(mut self, depth: usize) -> Self {
        self.target.rotation_depth = depth;
        self
    }

    /// 필터를 추가합니다.
    pub fn filter(mut self, filter: Arc<Filter>) -> Self {
        self.target.filters.push(filter);
        self
    }

    /// 설정을 검증하고 `WatchTarget`을 생성합니다.
    pub fn build(self) -> Result<WatchTarget, WatcherError> {
        self.target.validate()?;
        Ok(self.target)
    }
}
