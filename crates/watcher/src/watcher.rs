//! 파일 watcher -- 폴링 루프와 체크포인트 상태 머신
//!
//! [`Watcher`]는 감시 대상 하나에 대해 다음 단계를 반복합니다.
//!
//! ```text
//! Starting ──(즉시 1회 poll)──> Idle ──tick──> Polling ──> Idle ──> … ──cancel──> Stopped
//! ```
//!
//! 각 poll 단계는 LineReader → MatchEngine → Dispatcher 순서로 실행되며,
//! 체크포인트 전이는 [`TailState::commit`]이 결정합니다.
//!
//! # 내구성 규칙
//! - 읽기 위치(`position`)는 성공한 단계마다 메모리에서 전진합니다.
//! - 디스크 기록(`durable`)은 이벤트가 1개 이상이고 모두 전송된 단계에서만 일어납니다.
//! - 실패한 단계는 상태를 바꾸지 않으므로 같은 바이트 범위를 다음 틱에서 다시 처리합니다.
//!
//! 읽기, 디스패치 실패는 로그를 남기고 다음 틱으로 넘어갑니다.
//! 로테이션 추적 상실과 체크포인트 저장 실패는 watcher를 종료시킵니다.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use logalert_core::metrics as m;

use crate::checkpoint::{Checkpoint, CheckpointStore, FileIdentity};
use crate::config::WatchTarget;
use crate::dispatcher::Dispatcher;
use crate::error::WatcherError;
use crate::filter::Filter;
use crate::matcher::{DateStripper, aggregate};
use crate::reader::{LineReader, ReadOutcome};
use crate::rotation::RotationChain;

/// watcher 생명주기 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherPhase {
    /// 생성됨, 첫 poll 전
    Starting,
    /// poll 단계 실행 중
    Polling,
    /// 다음 틱 대기 중
    Idle,
    /// 취소 또는 치명적 에러로 종료됨
    Stopped,
}

/// 단계 성공 후 체크포인트 기록 여부
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    /// 기록하지 않음
    Skip,
    /// 이 체크포인트를 기록
    Write(Checkpoint),
}

/// 메모리 읽기 위치와 마지막으로 기록된 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailState {
    /// 다음 읽기를 시작할 위치
    pub position: Checkpoint,
    /// 디스크에 기록된 위치
    pub durable: Checkpoint,
}

impl TailState {
    /// 기록된 체크포인트에서 시작하는 상태
    pub fn new(checkpoint: Checkpoint) -> Self {
        Self {
            position: checkpoint,
            durable: checkpoint,
        }
    }

    /// 성공한 단계의 결과를 반영한 다음 상태와 기록 여부를 계산합니다.
    ///
    /// `dispatched`는 모두 전송에 성공한 이벤트 수입니다.
    pub fn commit(&self, read: Checkpoint, dispatched: usize) -> (TailState, Persist) {
        if dispatched > 0 && read != self.durable {
            (
                TailState {
                    position: read,
                    durable: read,
                },
                Persist::Write(read),
            )
        } else {
            (
                TailState {
                    position: read,
                    durable: self.durable,
                },
                Persist::Skip,
            )
        }
    }
}

/// 감시 대상 하나의 폴링 태스크
pub struct Watcher {
    name: String,
    reader: Arc<Mutex<LineReader>>,
    store: CheckpointStore,
    state: TailState,
    filters: Vec<Arc<Filter>>,
    date: Option<DateStripper>,
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
    phase: WatcherPhase,
}

impl Watcher {
    /// watcher를 생성합니다.
    ///
    /// 필터의 notifier 참조와 날짜 패턴을 검증하고, 체크포인트를 불러옵니다.
    /// 기록이 없으면 현재 파일의 시작 위치를 즉시 기록합니다.
    pub async fn new(
        target: WatchTarget,
        state_dir: impl AsRef<Path>,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<Self, WatcherError> {
        target.validate()?;
        for filter in &target.filters {
            dispatcher.check_filter(filter)?;
        }
        let date = target
            .date_format
            .as_deref()
            .map(|pattern| DateStripper::new(pattern, &target.name))
            .transpose()?;

        let store = CheckpointStore::new(state_dir, &target.path);
        let checkpoint = match store.load().await? {
            Some(checkpoint) => {
                info!(
                    file = %target.name,
                    offset = checkpoint.offset,
                    "resuming from checkpoint"
                );
                checkpoint
            }
            None => {
                let metadata = tokio::fs::metadata(&target.path).await?;
                let checkpoint = Checkpoint::start_of(FileIdentity::from_metadata(&metadata)?);
                store.save(&checkpoint).await?;
                info!(file = %target.name, "no checkpoint found, starting at offset 0");
                checkpoint
            }
        };

        let chain = RotationChain::new(&target.path, target.rotation_depth);
        Ok(Self {
            name: target.name,
            reader: Arc::new(Mutex::new(LineReader::new(chain, target.buffer_size))),
            store,
            state: TailState::new(checkpoint),
            filters: target.filters,
            date,
            dispatcher,
            interval: target.interval,
            phase: WatcherPhase::Starting,
        })
    }

    /// 표시 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 현재 단계
    pub fn phase(&self) -> WatcherPhase {
        self.phase
    }

    /// 현재 체크포인트 상태
    pub fn state(&self) -> TailState {
        self.state
    }

    /// poll 단계를 한 번 실행하고 전송한 이벤트 수를 반환합니다.
    ///
    /// 에러가 나면 상태는 변하지 않습니다.
    pub async fn poll(&mut self) -> Result<usize, WatcherError> {
        self.phase = WatcherPhase::Polling;

        let outcome = match self.read().await {
            Ok(outcome) => outcome,
            Err(e) => {
                counter!(m::READ_FAILURES_TOTAL, m::LABEL_FILE => self.name.clone()).increment(1);
                return Err(e);
            }
        };
        counter!(m::LINES_READ_TOTAL, m::LABEL_FILE => self.name.clone())
            .increment(outcome.lines.len() as u64);

        let messages = aggregate(
            &outcome.lines,
            &self.filters,
            self.date.as_ref(),
            &self.name,
        );
        debug!(
            file = %self.name,
            lines = outcome.lines.len(),
            events = messages.len(),
            "poll step read new data"
        );

        for message in &messages {
            if let Err(e) = self.dispatcher.dispatch(message).await {
                counter!(m::DISPATCH_FAILURES_TOTAL, m::LABEL_FILE => self.name.clone())
                    .increment(1);
                return Err(e);
            }
        }
        counter!(m::EVENTS_TOTAL, m::LABEL_FILE => self.name.clone())
            .increment(messages.len() as u64);

        let (next, persist) = self.state.commit(outcome.checkpoint, messages.len());
        if let Persist::Write(checkpoint) = persist {
            self.store.save(&checkpoint).await?;
            counter!(m::CHECKPOINT_WRITES_TOTAL, m::LABEL_FILE => self.name.clone()).increment(1);
        }
        self.state = next;

        Ok(messages.len())
    }

    /// 취소될 때까지 폴링합니다.
    ///
    /// 즉시 한 번 poll한 뒤 주기마다 반복합니다. 진행 중인 단계는 끝까지 실행되고,
    /// 취소는 대기 구간에서만 관찰됩니다. 치명적 에러가 나면 그 에러를 반환합니다.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), WatcherError> {
        info!(file = %self.name, interval_secs = self.interval.as_secs(), "watcher started");
        gauge!(m::WATCHERS_RUNNING).increment(1.0);

        let result = self.run_loop(&cancel).await;

        gauge!(m::WATCHERS_RUNNING).decrement(1.0);
        self.phase = WatcherPhase::Stopped;
        match &result {
            Ok(()) => info!(file = %self.name, "watcher stopped"),
            Err(e) => error!(file = %self.name, error = %e, "watcher stopped on fatal error"),
        }
        result
    }

    async fn run_loop(&mut self, cancel: &CancellationToken) -> Result<(), WatcherError> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        self.step().await?;

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.phase = WatcherPhase::Idle;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => self.step().await?,
            }
        }
    }

    /// poll 한 번. 일시적 에러는 로그만 남기고 삼킵니다.
    async fn step(&mut self) -> Result<(), WatcherError> {
        match self.poll().await {
            Ok(_) => Ok(()),
            Err(e) if !e.is_fatal() => {
                warn!(file = %self.name, error = %e, "poll step failed, will retry on next tick");
                self.phase = WatcherPhase::Idle;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn read(&self) -> Result<ReadOutcome, WatcherError> {
        let reader = Arc::clone(&self.reader);
        let position = self.state.position;
        tokio::task::spawn_blocking(move || {
            let mut reader = reader
                .lock()
                .map_err(|_| WatcherError::Task("line reader lock poisoned".to_owned()))?;
            reader.read_new(&position)
        })
        .await
        .map_err(|e| WatcherError::Task(format!("read task failed: {e}")))?
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("state", &self.state)
            .finish()
    }
}
