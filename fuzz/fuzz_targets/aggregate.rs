#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logalert_core::config::FilterConfig;
use logalert_watcher::{DateStripper, Filter, aggregate};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 정규식 (컴파일 실패 시 입력을 버림)
    pattern: String,
    exception: Option<String>,
    /// `%` 치환자를 포함할 수 있는 템플릿
    subject: String,
    message: String,
    date_format: Option<String>,
    lines: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    // 큰 입력은 정규식 컴파일 시간만 늘림
    if input.pattern.len() > 256 || input.lines.len() > 64 {
        return;
    }

    let config = FilterConfig {
        name: "fuzz".to_owned(),
        pattern: input.pattern,
        exceptions: input.exception.into_iter().collect(),
        subject: input.subject,
        message: input.message,
        ..Default::default()
    };
    let Ok(filter) = Filter::from_config(&config, "fuzz-host") else {
        return;
    };
    let date = match input.date_format.as_deref() {
        Some(pattern) => match DateStripper::new(pattern, "fuzz") {
            Ok(stripper) => Some(stripper),
            Err(_) => return,
        },
        None => None,
    };

    let filters = [Arc::new(filter)];
    let messages = aggregate(&input.lines, &filters, date.as_ref(), "fuzz.log");

    let total: usize = messages.iter().map(|m| m.count).sum();
    assert!(total <= input.lines.len());
});
