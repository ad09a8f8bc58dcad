use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// 取消令牌：调用方与被调用方共享同一个原子位。
///
/// # 契约说明（What）
/// - [`Self::cancel`] 只在首次调用时返回 `true`；
/// - [`Self::cancelled`] 在令牌被取消后完成，可放进 `tokio::select!` 与 I/O 竞争；
/// - 克隆得到的令牌共享状态，分发表把它原样交给声明了取消参数的服务方法。
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    inner: Arc<CancellationState>,
}

#[derive(Debug, Default)]
struct CancellationState {
    flag: AtomicBool,
    notify: Notify,
}

impl Cancellation {
    /// 创建处于“未取消”状态的令牌。
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// 标记取消并唤醒所有等待者。
    pub fn cancel(&self) -> bool {
        let first = self
            .inner
            .flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    /// 等待令牌被取消。
    pub async fn cancelled(&self) {
        loop {
            let mut notified = pin!(self.inner.notify.notified());
            // 先登记再检查标志位，避免错过 `cancel` 与等待之间的唤醒。
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// 两个令牌是否共享同一状态。
    pub fn same_as(&self, other: &Cancellation) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cancel_reports_first_transition_only() {
        let token = Cancellation::new();
        let child = token.clone();
        assert!(!child.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(child.is_cancelled());
        assert!(child.same_as(&token));
    }

    #[tokio::test]
    async fn cancelled_wakes_pending_waiter() {
        let token = Cancellation::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter must wake")
            .unwrap();
    }

    #[test]
    fn cancelled_returns_immediately_when_already_cancelled() {
        let token = Cancellation::new();
        token.cancel();
        futures::executor::block_on(token.cancelled());
    }
}
