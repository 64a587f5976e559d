//! 디스패처 -- 집계된 메시지를 필터에 바인딩된 notifier로 전송
//!
//! [`Dispatcher`]는 이름으로 등록된 전송 수단([`DynNotifier`])을 보관하며,
//! 여러 watcher가 `Arc`로 공유합니다. 상태를 가진 전송 구현체는
//! 동시 전송을 스스로 직렬화해야 합니다.
//!
//! 전송 실패는 재시도하지 않고 호출자에게 그대로 보고합니다.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use logalert_core::notifier::DynNotifier;

use crate::error::WatcherError;
use crate::filter::Filter;
use crate::message::Message;

/// notifier 레지스트리 및 전송기
#[derive(Default)]
pub struct Dispatcher {
    notifiers: HashMap<String, Arc<dyn DynNotifier>>,
}

impl Dispatcher {
    /// 빈 디스패처를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// notifier를 등록합니다. 이름이 중복되면 에러를 반환합니다.
    pub fn register(&mut self, notifier: Arc<dyn DynNotifier>) -> Result<(), WatcherError> {
        let name = notifier.name().to_owned();
        if self.notifiers.contains_key(&name) {
            return Err(WatcherError::DuplicateNotifier(name));
        }
        debug!(notifier = %name, kind = notifier.notifier_type(), "notifier registered");
        self.notifiers.insert(name, notifier);
        Ok(())
    }

    /// 등록된 notifier 수
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// 필터가 참조하는 모든 notifier가 등록되어 있는지 확인합니다.
    pub fn check_filter(&self, filter: &Filter) -> Result<(), WatcherError> {
        match filter
            .notifications()
            .iter()
            .find(|name| !self.notifiers.contains_key(name.as_str()))
        {
            Some(missing) => Err(WatcherError::UnknownNotifier(missing.clone())),
            None => Ok(()),
        }
    }

    /// 메시지를 필터에 바인딩된 notifier들에게 순서대로 전송합니다.
    ///
    /// 첫 번째 실패에서 중단합니다.
    pub async fn dispatch(&self, message: &Message) -> Result<(), WatcherError> {
        for name in message.filter.notifications() {
            let notifier = self
                .notifiers
                .get(name)
                .ok_or_else(|| WatcherError::UnknownNotifier(name.clone()))?;

            notifier
                .send(&message.subject, &message.text)
                .await
                .map_err(|source| WatcherError::Dispatch {
                    notifier: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// 모든 notifier를 닫습니다. 실패는 로그로만 남깁니다.
    pub async fn close_all(&self) {
        for (name, notifier) in &self.notifiers {
            if let Err(e) = notifier.close().await {
                warn!(notifier = %name, error = %e, "failed to close notifier");
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("notifiers", &self.notifiers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// 테스트용 Mock notifier
#[cfg(test)]
#[derive(Default)]
pub struct MockNotifier {
    /// 등록 이름
    pub name: String,
    /// 전송된 (제목, 본문) 목록
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
    /// 전송 실패를 시뮬레이션할지 여부
    pub fail: std::sync::atomic::AtomicBool,
    /// close 호출 횟수
    pub closes: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockNotifier {
    /// 이름으로 mock notifier를 생성합니다.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// 전송이 실패하도록 설정합니다.
    pub fn failing(self) -> Self {
        self.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        self
    }

    /// 전송된 제목 목록
    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(s, _)| s.clone())
            .collect()
    }
}

#[cfg(test)]
impl logalert_core::notifier::Notifier for MockNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn notifier_type(&self) -> &str {
        "mock"
    }

    async fn send(
        &self,
        subject: &str,
        text: &str,
    ) -> Result<(), logalert_core::error::NotifierError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(logalert_core::error::NotifierError::SendFailed {
                notifier: self.name.clone(),
                reason: "simulated failure".to_owned(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_owned(), text.to_owned()));
        Ok(())
    }

    async fn close(&self) -> Result<(), logalert_core::error::NotifierError> {
        self.closes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
