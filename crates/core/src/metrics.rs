//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! watcher는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. recorder가 설치되지 않으면 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logalert_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logalert_core::metrics::LINES_READ_TOTAL, "file" => "app").increment(12);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 감시 파일 레이블 키 (파일 표시 이름)
pub const LABEL_FILE: &str = "file";

// ─── Watcher 메트릭 ─────────────────────────────────────────────────

/// 읽은 전체 라인 수 (counter, label: file)
pub const LINES_READ_TOTAL: &str = "logalert_lines_read_total";

/// 생성된 알림 이벤트 수 (counter, label: file)
pub const EVENTS_TOTAL: &str = "logalert_events_total";

/// 알림 전송 실패 수 (counter, label: file)
pub const DISPATCH_FAILURES_TOTAL: &str = "logalert_dispatch_failures_total";

/// 읽기 실패 수 (counter, label: file)
pub const READ_FAILURES_TOTAL: &str = "logalert_read_failures_total";

/// 체크포인트 저장 횟수 (counter, label: file)
pub const CHECKPOINT_WRITES_TOTAL: &str = "logalert_checkpoint_writes_total";

/// 실행 중인 watcher 수 (gauge)
pub const WATCHERS_RUNNING: &str = "logalert_watchers_running";

/// 정의된 모든 메트릭 이름
pub const ALL_METRIC_NAMES: &[&str] = &[
    LINES_READ_TOTAL,
    EVENTS_TOTAL,
    DISPATCH_FAILURES_TOTAL,
    READ_FAILURES_TOTAL,
    CHECKPOINT_WRITES_TOTAL,
    WATCHERS_RUNNING,
];

/// 모든 메트릭의 설명을 등록합니다.
///
/// Prometheus recorder 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        LINES_READ_TOTAL,
        "Total number of complete lines read from watched files"
    );
    describe_counter!(
        EVENTS_TOTAL,
        "Total number of grouped alert events produced by filters"
    );
    describe_counter!(
        DISPATCH_FAILURES_TOTAL,
        "Polls aborted because a notifier failed to deliver an event"
    );
    describe_counter!(
        READ_FAILURES_TOTAL,
        "Polls aborted because the watched file could not be read"
    );
    describe_counter!(
        CHECKPOINT_WRITES_TOTAL,
        "Number of checkpoint records persisted to the state directory"
    );
    describe_gauge!(WATCHERS_RUNNING, "Number of file watchers currently polling");
}
