//! 필터 -- 매칭 정규식, 예외 정규식, 알림 템플릿
//!
//! [`Filter`]는 설정의 `[[filters]]` 항목을 컴파일한 불변 객체입니다.
//! 정규식은 생성 시 한 번만 컴파일합니다.
//!
//! # 템플릿 플레이스홀더
//! | 플레이스홀더 | 값 |
//! |---|---|
//! | `%hostname` | 필터 생성 시 결정된 호스트명 |
//! | `%filename` | 감시 파일 표시 이름 |
//! | `%filtername`, `%name` | 필터 이름 |
//! | `%count` | 발생 횟수 |
//! | `%text` | 정규화된 매칭 라인 |

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use logalert_core::config::FilterConfig;

use crate::error::WatcherError;

/// 컴파일된 필터
#[derive(Debug)]
pub struct Filter {
    name: String,
    pattern: Regex,
    exceptions: Vec<Regex>,
    subject: String,
    message: String,
    notifications: Vec<String>,
    hostname: String,
}

impl Filter {
    /// 설정에서 필터를 생성합니다.
    ///
    /// 바인딩된 notifier 이름은 처음 등장 순서를 유지하며 중복 제거됩니다.
    pub fn from_config(config: &FilterConfig, hostname: &str) -> Result<Self, WatcherError> {
        let compile = |pattern: &str, what: &str| {
            Regex::new(pattern).map_err(|e| WatcherError::InvalidPattern {
                filter: config.name.clone(),
                reason: format!("{what} '{pattern}': {e}"),
            })
        };

        let pattern = compile(&config.pattern, "pattern")?;
        let exceptions = config
            .exceptions
            .iter()
            .map(|ex| compile(ex, "exception"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut notifications: Vec<String> = Vec::with_capacity(config.notifications.len());
        for name in &config.notifications {
            if !notifications.contains(name) {
                notifications.push(name.clone());
            }
        }

        Ok(Self {
            name: config.name.clone(),
            pattern,
            exceptions,
            subject: config.subject.clone(),
            message: config.message.clone(),
            notifications,
            hostname: hostname.to_owned(),
        })
    }

    /// 필터 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 알림을 보낼 notifier 이름 (중복 제거됨)
    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    /// 라인이 매칭 정규식에 걸리고 어떤 예외에도 걸리지 않으면 `true`
    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line) && !self.exceptions.iter().any(|ex| ex.is_match(line))
    }

    /// 제목 템플릿을 렌더링합니다.
    pub fn render_subject(&self, file_name: &str, count: usize, text: &str) -> String {
        self.render(&self.subject, file_name, count, text)
    }

    /// 본문 템플릿을 렌더링합니다.
    pub fn render_message(&self, file_name: &str, count: usize, text: &str) -> String {
        self.render(&self.message, file_name, count, text)
    }

    /// 한 번의 스캔으로 치환하므로 치환된 값 안의 `%…`는 다시 해석되지 않습니다.
    fn render(&self, template: &str, file_name: &str, count: usize, text: &str) -> String {
        let count = count.to_string();
        let placeholders: [(&str, &str); 6] = [
            ("%hostname", &self.hostname),
            ("%filename", file_name),
            ("%filtername", &self.name),
            ("%name", &self.name),
            ("%count", &count),
            ("%text", text),
        ];

        let mut out = String::with_capacity(template.len() + text.len());
        let mut rest = template;
        while let Some(idx) = rest.find('%') {
            out.push_str(&rest[..idx]);
            let tail = &rest[idx..];
            match placeholders.iter().find(|(key, _)| tail.starts_with(key)) {
                Some((key, value)) => {
                    out.push_str(value);
                    rest = &tail[key.len()..];
                }
                None => {
                    out.push('%');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// 이름으로 조회 가능한 필터 집합
#[derive(Debug, Default)]
pub struct FilterSet {
    filters: HashMap<String, Arc<Filter>>,
}

impl FilterSet {
    /// 설정의 모든 필터를 컴파일합니다.
    pub fn from_config(configs: &[FilterConfig], hostname: &str) -> Result<Self, WatcherError> {
        let filters = configs
            .iter()
            .map(|c| {
                let filter = Filter::from_config(c, hostname)?;
                Ok::<_, WatcherError>((c.name.clone(), Arc::new(filter)))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { filters })
    }

    /// 이름으로 필터를 조회합니다.
    pub fn get(&self, name: &str) -> Result<Arc<Filter>, WatcherError> {
        self.filters
            .get(name)
            .cloned()
            .ok_or_else(|| WatcherError::UnknownFilter(name.to_owned()))
    }

    /// 등록된 필터 수
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// 모든 필터를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Filter>> {
        self.filters.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pattern: &str, exceptions: &[&str]) -> FilterConfig {
        FilterConfig {
            name: "errors".to_owned(),
            pattern: pattern.to_owned(),
            exceptions: exceptions.iter().map(|s| (*s).to_owned()).collect(),
            subject: "[%hostname] %filtername in %filename".to_owned(),
            message: "%count x %text".to_owned(),
            notifications: vec!["ops".to_owned(), "mail".to_owned(), "ops".to_owned()],
        }
    }

    #[test]
    fn matches_primary_pattern() {
        let filter = Filter::from_config(&config("ERROR", &[]), "host").unwrap();
        assert!(filter.matches("2024 ERROR disk full"));
        assert!(!filter.matches("2024 INFO all good"));
    }

    #[test]
    fn exception_vetoes_match() {
        let filter =
            Filter::from_config(&config("ERROR", &["healthcheck", "deprecated"]), "host").unwrap();
        assert!(!filter.matches("ERROR healthcheck failed"));
        assert!(!filter.matches("ERROR deprecated api"));
        assert!(filter.matches("ERROR real problem"));
    }

    #[test]
    fn invalid_pattern_names_filter() {
        let err = Filter::from_config(&config("(unclosed", &[]), "host").unwrap_err();
        match err {
            WatcherError::InvalidPattern { filter, reason } => {
                assert_eq!(filter, "errors");
                assert!(reason.contains("(unclosed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_exception_is_rejected() {
        assert!(Filter::from_config(&config("ok", &["[bad"]), "host").is_err());
    }

    #[test]
    fn notifications_are_deduplicated_in_order() {
        let filter = Filter::from_config(&config("x", &[]), "host").unwrap();
        assert_eq!(filter.notifications(), &["ops".to_owned(), "mail".to_owned()]);
    }

    #[test]
    fn renders_all_placeholders() {
        let filter = Filter::from_config(&config("x", &[]), "web-01").unwrap();
        assert_eq!(
            filter.render_subject("app", 3, "boom"),
            "[web-01] errors in app"
        );
        assert_eq!(filter.render_message("app", 3, "boom"), "3 x boom");
    }

    #[test]
    fn name_alias_and_unknown_placeholders() {
        let mut cfg = config("x", &[]);
        cfg.message = "%name: 100% sure, %unknown".to_owned();
        let filter = Filter::from_config(&cfg, "h").unwrap();
        assert_eq!(filter.render_message("f", 1, "t"), "errors: 100% sure, %unknown");
    }

    #[test]
    fn substituted_text_is_not_reinterpreted() {
        let filter = Filter::from_config(&config("x", &[]), "h").unwrap();
        assert_eq!(
            filter.render_message("f", 2, "literal %count"),
            "2 x literal %count"
        );
    }

    #[test]
    fn filter_set_lookup() {
        let set = FilterSet::from_config(&[config("x", &[])], "h").unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.get("errors").is_ok());
        assert!(matches!(
            set.get("missing").unwrap_err(),
            WatcherError::UnknownFilter(_)
        ));
    }
}
