//! 읽기 버퍼 크기 해석
//!
//! `"64Kb"`, `"1 MB"`, `"4096b"` 같은 사람이 읽는 크기 표기를 바이트 수로 변환합니다.
//!
//! # 형식
//! `<숫자>[공백 1개]<단위>`, 단위는 대소문자 무관 `b`, `k`, `kb`, `m`, `mb`.
//!
//! 범위([`MIN_BUFFER_SIZE`], [`MAX_BUFFER_SIZE`])를 벗어나면 잘라내지 않고 실패합니다.

use tracing::warn;

/// 최소 읽기 버퍼 크기 (바이트)
pub const MIN_BUFFER_SIZE: usize = 1024;

/// 최대 읽기 버퍼 크기 (바이트)
pub const MAX_BUFFER_SIZE: usize = 10_000_000;

/// 크기 표기를 바이트 수로 변환합니다.
///
/// 형식이 잘못되었거나 범위를 벗어나면 경고를 남기고 `None`을 반환합니다.
///
/// ```
/// use logalert_watcher::buffer::parse_buffer_size;
///
/// assert_eq!(parse_buffer_size("1 KB"), Some(1024));
/// assert_eq!(parse_buffer_size("8MB"), Some(8 * 1024 * 1024));
/// assert_eq!(parse_buffer_size("1000Mb"), None);
/// ```
pub fn parse_buffer_size(raw: &str) -> Option<usize> {
    let Some((value, unit)) = split_size(raw) else {
        warn!(raw, "read buffer size does not match <digits><unit>");
        return None;
    };

    let multiplier: u64 = match unit.to_ascii_lowercase().as_str() {
        "b" => 1,
        "k" | "kb" => 1024,
        "m" | "mb" => 1024 * 1024,
        other => {
            warn!(raw, unit = other, "unknown read buffer size unit");
            return None;
        }
    };

    let bytes = match value.checked_mul(multiplier) {
        Some(bytes) if bytes <= MAX_BUFFER_SIZE as u64 => bytes as usize,
        _ => {
            warn!(raw, max = MAX_BUFFER_SIZE, "read buffer size exceeds the limit");
            return None;
        }
    };

    if bytes < MIN_BUFFER_SIZE {
        warn!(raw, min = MIN_BUFFER_SIZE, "read buffer size below the minimum");
        return None;
    }

    Some(bytes)
}

/// 숫자부와 단위부를 분리합니다. 단위는 1~2글자여야 합니다.
fn split_size(raw: &str) -> Option<(u64, &str)> {
    let digits_end = raw
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)?;
    if digits_end == 0 {
        return None;
    }

    let value = raw[..digits_end].parse::<u64>().ok()?;
    let rest = &raw[digits_end..];
    let unit = rest.strip_prefix(' ').unwrap_or(rest);

    let unit_len = unit.chars().count();
    if !(1..=2).contains(&unit_len) || !unit.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((value, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_documented_examples() {
        assert_eq!(parse_buffer_size("1Kb"), Some(1024));
        assert_eq!(parse_buffer_size("1 KB"), Some(1024));
        assert_eq!(parse_buffer_size("8MB"), Some(8_388_608));
        assert_eq!(parse_buffer_size("10k"), Some(10_240));
        assert_eq!(parse_buffer_size("4096b"), Some(4096));
    }

    #[test]
    fn rejects_below_minimum() {
        assert_eq!(parse_buffer_size("500b"), None);
        assert_eq!(parse_buffer_size("0kb"), None);
    }

    #[test]
    fn rejects_above_ceiling() {
        assert_eq!(parse_buffer_size("1000Mb"), None);
        assert_eq!(parse_buffer_size("10000000000000000000000kb"), None);
    }

    #[test]
    fn accepts_exact_ceiling() {
        assert_eq!(parse_buffer_size("10000000b"), Some(MAX_BUFFER_SIZE));
        assert_eq!(parse_buffer_size("10000001b"), None);
    }

    #[test]
    fn rejects_malformed_input() {
        for raw in ["10kbb", "a kb", "", "kb", "10", "10  kb", " 10kb", "10gb", "10kb "] {
            assert_eq!(parse_buffer_size(raw), None, "{raw:?} should fail");
        }
    }

    proptest! {
        #[test]
        fn kilobytes_multiply_exactly(value in 1u64..=9765, space in any::<bool>(), upper in any::<bool>()) {
            let unit = if upper { "KB" } else { "kb" };
            let sep = if space { " " } else { "" };
            let raw = format!("{value}{sep}{unit}");
            prop_assert_eq!(parse_buffer_size(&raw), Some(value as usize * 1024));
        }

        #[test]
        fn result_always_in_range(raw in "[0-9]{1,9} ?[bBkKmM]{1,2}") {
            if let Some(bytes) = parse_buffer_size(&raw) {
                prop_assert!((MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&bytes));
            }
        }
    }
}
