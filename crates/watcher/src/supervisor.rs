//! watcher 집합 구성 및 동시 실행
//!
//! [`build_watchers`]는 설정에서 모든 watcher를 만들고,
//! [`run_watchers`]는 watcher마다 태스크 하나를 띄워 모두 끝날 때까지 기다립니다.
//!
//! 한 watcher가 치명적 에러로 멈추면 공유 취소 토큰을 취소하여
//! 나머지 watcher도 정상 종료시킵니다.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use logalert_core::config::LogalertConfig;

use crate::config::WatchTarget;
use crate::dispatcher::Dispatcher;
use crate::error::WatcherError;
use crate::filter::FilterSet;
use crate::watcher::Watcher;

/// 설정의 모든 `[[files]]` 항목에 대해 watcher를 생성합니다.
///
/// 정규식, 버퍼 크기, notifier 참조, 체크포인트 디렉토리 중 하나라도
/// 잘못되면 에러를 반환합니다.
pub async fn build_watchers(
    config: &LogalertConfig,
    hostname: &str,
    dispatcher: Arc<Dispatcher>,
) -> Result<Vec<Watcher>, WatcherError> {
    let filters = FilterSet::from_config(&config.filters, hostname)?;
    let state_dir = Path::new(&config.general.state_dir);

    let mut watchers = Vec::with_capacity(config.files.len());
    for file in &config.files {
        let target = WatchTarget::from_core(file, &filters)?;
        watchers.push(Watcher::new(target, state_dir, Arc::clone(&dispatcher)).await?);
    }
    Ok(watchers)
}

/// watcher마다 태스크를 띄우고 모두 종료될 때까지 기다립니다.
///
/// 모든 watcher가 취소로 정상 종료되면 `Ok(())`,
/// 하나라도 치명적 에러로 멈췄으면 첫 번째 에러를 반환합니다.
pub async fn run_watchers(
    watchers: Vec<Watcher>,
    cancel: CancellationToken,
) -> Result<(), WatcherError> {
    info!(count = watchers.len(), "starting watchers");

    let handles: Vec<(String, JoinHandle<Result<(), WatcherError>>)> = watchers
        .into_iter()
        .map(|mut watcher| {
            let name = watcher.name().to_owned();
            let cancel = cancel.clone();
            let handle = tokio::spawn(async move {
                let result = watcher.run(cancel.clone()).await;
                if result.is_err() {
                    // 한 watcher라도 치명적으로 멈추면 프로세스 전체를 내림
                    cancel.cancel();
                }
                result
            });
            (name, handle)
        })
        .collect();

    let mut first_error = None;
    for (name, handle) in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(join) => {
                error!(file = %name, error = %join, "watcher task panicked");
                cancel.cancel();
                first_error
                    .get_or_insert(WatcherError::Task(format!("watcher '{name}' failed: {join}")));
            }
        }
    }

    info!("all watchers stopped");
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
