//! 매칭 엔진 -- 라인 필터링, 날짜 제거, 폴링 주기 내 중복 집계
//!
//! [`aggregate`]는 새로 읽은 라인에 파일의 필터들을 적용하고,
//! 같은 필터에 걸린 동일 라인(날짜 제거 후)을 하나의 [`Message`]로 묶어 횟수를 셉니다.
//!
//! 출력 순서는 정의되지 않습니다 (필터별 해시 맵 기반 그룹화).

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use crate::error::WatcherError;
use crate::filter::Filter;
use crate::message::Message;

/// 그룹화 전에 라인에서 날짜 부분을 제거하는 정규식
///
/// 두 가지 형태를 받습니다.
///
/// - 캡처 그룹이 정확히 3개: 라인 전체를 `(앞)(날짜)(뒤)`로 나누는 패턴으로 보고,
///   매칭되면 1번과 3번 그룹만 남깁니다. 예: `^(.*?)(\d{4}-\d{2}-\d{2} )(.*)$`
/// - 그 외: 패턴이 라인에서 정확히 한 번 매칭될 때 그 부분만 잘라냅니다.
///   예: `^\d{4}-\d{2}-\d{2} `
///
/// 매칭되지 않으면 라인은 그대로입니다.
#[derive(Debug, Clone)]
pub struct DateStripper {
    pattern: Regex,
    split: bool,
}

impl DateStripper {
    /// 날짜 패턴을 컴파일합니다. `owner`는 에러 메시지에 쓰이는 파일 이름입니다.
    pub fn new(pattern: &str, owner: &str) -> Result<Self, WatcherError> {
        let pattern = Regex::new(pattern).map_err(|e| WatcherError::InvalidPattern {
            filter: owner.to_owned(),
            reason: format!("date_format '{pattern}': {e}"),
        })?;
        // captures_len()은 전체 매칭(0번)을 포함
        let split = pattern.captures_len() == 4;
        Ok(Self { pattern, split })
    }

    /// 라인에서 날짜 부분을 제거합니다.
    pub fn strip<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if self.split {
            return match self.pattern.captures(line) {
                Some(caps) => {
                    let head = caps.get(1).map_or("", |m| m.as_str());
                    let tail = caps.get(3).map_or("", |m| m.as_str());
                    Cow::Owned(format!("{head}{tail}"))
                }
                None => Cow::Borrowed(line),
            };
        }

        let mut matches = self.pattern.find_iter(line);
        let (Some(m), None) = (matches.next(), matches.next()) else {
            return Cow::Borrowed(line);
        };
        let mut stripped = String::with_capacity(line.len() - m.len());
        stripped.push_str(&line[..m.start()]);
        stripped.push_str(&line[m.end()..]);
        Cow::Owned(stripped)
    }
}

/// 라인 묶음을 필터별로 집계하여 메시지를 만듭니다.
///
/// 한 라인이 여러 필터에 동시에 매칭될 수 있습니다.
/// 각 메시지의 `count`는 같은 필터에서 같은 정규화 라인이 나온 횟수입니다.
pub fn aggregate(
    lines: &[String],
    filters: &[Arc<Filter>],
    date: Option<&DateStripper>,
    file_name: &str,
) -> Vec<Message> {
    let mut counts: Vec<HashMap<String, usize>> = vec![HashMap::new(); filters.len()];

    for line in lines {
        let mut normalized: Option<Cow<'_, str>> = None;
        for (filter, count) in filters.iter().zip(counts.iter_mut()) {
            if !filter.matches(line) {
                continue;
            }
            let key = normalized.get_or_insert_with(|| match date {
                Some(stripper) => stripper.strip(line),
                None => Cow::Borrowed(line.as_str()),
            });
            *count.entry(key.to_string()).or_insert(0) += 1;
        }
    }

    filters
        .iter()
        .zip(counts)
        .flat_map(|(filter, count)| {
            count
                .into_iter()
                .map(move |(line, n)| Message::render(filter, file_name, line, n))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logalert_core::config::FilterConfig;
    use proptest::prelude::*;

    fn filter(name: &str, pattern: &str, exceptions: &[&str]) -> Arc<Filter> {
        let cfg = FilterConfig {
            name: name.to_owned(),
            pattern: pattern.to_owned(),
            exceptions: exceptions.iter().map(|s| (*s).to_owned()).collect(),
            subject: "%filtername@%filename".to_owned(),
            message: "%count: %text".to_owned(),
            notifications: vec![],
        };
        Arc::new(Filter::from_config(&cfg, "host").unwrap())
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    fn triples(messages: &[Message]) -> Vec<(String, String, usize)> {
        let mut out: Vec<_> = messages
            .iter()
            .map(|m| (m.filter.name().to_owned(), m.line.clone(), m.count))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn date_stripper_removes_single_match() {
        let stripper = DateStripper::new(r"\d{4}-\d{2}-\d{2} ", "app").unwrap();
        assert_eq!(stripper.strip("2024-01-15 ERROR disk"), "ERROR disk");
    }

    #[test]
    fn date_stripper_ignores_zero_or_multiple_matches() {
        let stripper = DateStripper::new(r"\d{4}-\d{2}-\d{2}", "app").unwrap();
        assert_eq!(stripper.strip("ERROR disk"), "ERROR disk");
        assert_eq!(
            stripper.strip("2024-01-15 copied 2024-01-14"),
            "2024-01-15 copied 2024-01-14"
        );
    }

    #[test]
    fn date_stripping_is_idempotent() {
        let stripper = DateStripper::new(r"^\w{3} \d{2} \d{2}:\d{2}:\d{2} ", "app").unwrap();
        let once = stripper.strip("Jan 15 12:00:00 kernel: oops").into_owned();
        assert_eq!(once, "kernel: oops");
        assert_eq!(stripper.strip(&once), once);
    }

    #[test]
    fn three_group_pattern_keeps_text_around_date() {
        let stripper =
            DateStripper::new(r"^(.*?)(\d{4}-\d{2}-\d{2} )(.*)$", "app").unwrap();
        assert_eq!(
            stripper.strip("[db] 2024-01-15 ERROR disk full"),
            "[db] ERROR disk full"
        );
        assert_eq!(stripper.strip("ERROR no date here"), "ERROR no date here");
    }

    #[test]
    fn three_group_pattern_keeps_distinct_lines_apart() {
        let stripper =
            DateStripper::new(r"^(.*?)(\d{4}-\d{2}-\d{2} )(.*)$", "app").unwrap();
        let input = lines(&[
            "2024-01-15 ERROR disk full",
            "2024-01-16 ERROR disk full",
            "2024-01-16 ERROR cpu hot",
        ]);
        let messages = aggregate(&input, &[filter("errors", "ERROR", &[])], Some(&stripper), "app");

        assert_eq!(
            triples(&messages),
            vec![
                ("errors".to_owned(), "ERROR cpu hot".to_owned(), 1),
                ("errors".to_owned(), "ERROR disk full".to_owned(), 2),
            ]
        );
    }

    #[test]
    fn invalid_date_pattern_is_rejected() {
        let err = DateStripper::new("([", "app").unwrap_err();
        assert!(err.to_string().contains("date_format"));
    }

    #[test]
    fn groups_identical_lines_after_stripping() {
        let stripper = DateStripper::new(r"^\d{2}:\d{2}:\d{2} ", "app").unwrap();
        let input = lines(&[
            "12:00:01 ERROR disk full",
            "12:00:02 ERROR disk full",
            "12:00:03 ERROR cpu hot",
            "12:00:04 INFO fine",
        ]);
        let messages = aggregate(&input, &[filter("errors", "ERROR", &[])], Some(&stripper), "app");

        assert_eq!(
            triples(&messages),
            vec![
                ("errors".to_owned(), "ERROR cpu hot".to_owned(), 1),
                ("errors".to_owned(), "ERROR disk full".to_owned(), 2),
            ]
        );
    }

    #[test]
    fn one_line_can_match_many_filters() {
        let input = lines(&["ERROR timeout talking to db"]);
        let filters = [filter("errors", "ERROR", &[]), filter("db", "db", &[])];
        let messages = aggregate(&input, &filters, None, "app");
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn exception_match_produces_no_event() {
        let input = lines(&["ERROR healthcheck", "ERROR healthcheck"]);
        let messages = aggregate(&input, &[filter("errors", "ERROR", &["health"])], None, "app");
        assert!(messages.is_empty());
    }

    #[test]
    fn renders_templates_with_count() {
        let input = lines(&["boom", "boom", "boom"]);
        let messages = aggregate(&input, &[filter("panic", "boom", &[])], None, "svc");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].subject, "panic@svc");
        assert_eq!(messages[0].text, "3: boom");
        assert_eq!(messages[0].file_name, "svc");
    }

    #[test]
    fn no_lines_no_events() {
        assert!(aggregate(&[], &[filter("a", ".", &[])], None, "app").is_empty());
    }

    proptest! {
        #[test]
        fn counts_sum_to_matching_lines(words in proptest::collection::vec("(ok|warn|fail|fail again)", 0..64)) {
            let f = filter("fail", "fail", &["again"]);
            let messages = aggregate(&words, &[Arc::clone(&f)], None, "app");

            let expected = words.iter().filter(|w| f.matches(w)).count();
            let total: usize = messages.iter().map(|m| m.count).sum();
            prop_assert_eq!(total, expected);

            let mut keys: Vec<_> = messages.iter().map(|m| m.line.clone()).collect();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(keys.len(), messages.len());
        }

        #[test]
        fn every_filter_key_count_matches_brute_force(
            raw in proptest::collection::vec(
                ("(2024-01-0[1-3] )?", "(ERROR|WARN|INFO) (disk|cpu|net)( again)?"),
                0..64,
            ),
            grouped in any::<bool>(),
        ) {
            let input: Vec<String> = raw.iter().map(|(date, body)| format!("{date}{body}")).collect();
            let filters = [
                filter("errors", "ERROR", &[]),
                filter("disk", "disk", &["INFO"]),
                filter("noisy", "ERROR|WARN", &["again"]),
            ];
            let pattern = if grouped {
                r"^(.*?)(\d{4}-\d{2}-\d{2} )(.*)$"
            } else {
                r"^\d{4}-\d{2}-\d{2} "
            };
            let stripper = DateStripper::new(pattern, "app").unwrap();

            let mut expected = std::collections::BTreeMap::new();
            for f in &filters {
                for line in input.iter().filter(|l| f.matches(l)) {
                    let key = stripper.strip(line).into_owned();
                    *expected.entry((f.name().to_owned(), key)).or_insert(0usize) += 1;
                }
            }

            let messages = aggregate(&input, &filters, Some(&stripper), "app");
            let actual: std::collections::BTreeMap<_, _> = messages
                .iter()
                .map(|m| ((m.filter.name().to_owned(), m.line.clone()), m.count))
                .collect();

            prop_assert_eq!(actual.len(), messages.len());
            prop_assert_eq!(actual, expected);
        }
    }
}
