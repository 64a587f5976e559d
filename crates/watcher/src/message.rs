//! 집계된 알림 이벤트

use std::sync::Arc;

use crate::filter::Filter;

/// 한 폴링 주기에서 (필터, 정규화된 라인) 쌍마다 하나씩 만들어지는 알림
///
/// 디스패치 직후 버려지며 영속화되지 않습니다.
#[derive(Debug, Clone)]
pub struct Message {
    /// 발생 파일 표시 이름
    pub file_name: String,
    /// 렌더링된 제목
    pub subject: String,
    /// 렌더링된 본문
    pub text: String,
    /// 발생 횟수
    pub count: usize,
    /// 정규화된 라인 (그룹화 키)
    pub line: String,
    /// 매칭된 필터
    pub filter: Arc<Filter>,
}

impl Message {
    /// 필터 템플릿으로 메시지를 만듭니다.
    pub fn render(filter: &Arc<Filter>, file_name: &str, line: String, count: usize) -> Self {
        Self {
            file_name: file_name.to_owned(),
            subject: filter.render_subject(file_name, count, &line),
            text: filter.render_message(file_name, count, &line),
            count,
            line,
            filter: Arc::clone(filter),
        }
    }
}
