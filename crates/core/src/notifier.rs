//! 알림 전송 trait — 전송 수단(transport) 추상화
//!
//! [`Notifier`]는 렌더링된 제목/본문을 외부로 전달하는 전송 구현체의 계약입니다.
//! 코어는 전송 방식(메일, 메신저 등)을 알지 못하며, 전송 실패는
//! [`NotifierError`]로 보고됩니다.
//!
//! `Notifier`는 RPITIT를 사용하므로 `dyn Notifier`가 불가합니다.
//! 이름으로 조회되는 레지스트리에는 [`DynNotifier`]를 사용합니다.
//!
//! # 생명주기
//! ```text
//! 생성 → send() * N → close() → (이후 send()는 Closed 에러)
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::error::NotifierError;

/// dyn-compatible trait에서 사용하는 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 알림 전송 수단
///
/// # 구현 예시
/// ```ignore
/// struct Stdout;
///
/// impl Notifier for Stdout {
///     fn name(&self) -> &str { "stdout" }
///     fn notifier_type(&self) -> &str { "stdout" }
///
///     async fn send(&self, subject: &str, text: &str) -> Result<(), NotifierError> {
///         println!("{subject}\n{text}");
///         Ok(())
///     }
///
///     async fn close(&self) -> Result<(), NotifierError> { Ok(()) }
/// }
/// ```
pub trait Notifier: Send + Sync {
    /// 설정에서 부여된 고유 이름
    fn name(&self) -> &str;

    /// 전송 유형 태그 (예: `"log"`)
    fn notifier_type(&self) -> &str;

    /// 제목과 본문을 전송합니다.
    ///
    /// 실패 시 재시도하지 않고 에러를 반환합니다.
    fn send(
        &self,
        subject: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), NotifierError>> + Send;

    /// 전송 수단을 닫습니다. 여러 번 호출해도 안전해야 합니다.
    fn close(&self) -> impl Future<Output = Result<(), NotifierError>> + Send;
}

/// dyn-compatible 알림 전송 trait
///
/// `Notifier`를 구현한 타입은 자동으로 `DynNotifier`도 구현됩니다.
pub trait DynNotifier: Send + Sync {
    /// 설정에서 부여된 고유 이름
    fn name(&self) -> &str;

    /// 전송 유형 태그
    fn notifier_type(&self) -> &str;

    /// 제목과 본문을 전송합니다.
    fn send<'a>(
        &'a self,
        subject: &'a str,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), NotifierError>>;

    /// 전송 수단을 닫습니다.
    fn close(&self) -> BoxFuture<'_, Result<(), NotifierError>>;
}

impl<T: Notifier> DynNotifier for T {
    fn name(&self) -> &str {
        Notifier::name(self)
    }

    fn notifier_type(&self) -> &str {
        Notifier::notifier_type(self)
    }

    fn send<'a>(
        &'a self,
        subject: &'a str,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), NotifierError>> {
        Box::pin(Notifier::send(self, subject, text))
    }

    fn close(&self) -> BoxFuture<'_, Result<(), NotifierError>> {
        Box::pin(Notifier::close(self))
    }
}
