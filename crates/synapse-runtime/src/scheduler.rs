//! Cancellation plumbing for scheduled sends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared cancellation flag with wakeup support.
pub(crate) struct CancelToken {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub(crate) fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub(crate) fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled.
    pub(crate) async fn notified(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Handle on a scheduled send; cancels the timer when dropped.
pub struct ScheduleHandle {
    token: Arc<CancelToken>,
}

impl ScheduleHandle {
    pub(crate) fn new(token: Arc<CancelToken>) -> Self {
        Self { token }
    }

    /// Stop the timer; firings already in flight still complete.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the timer was cancelled (or completed, for one-shots).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let token = Arc::new(CancelToken::new());
        let waiter = token.clone();

        let task = tokio::spawn(async move {
            waiter.notified().await;
        });

        token.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("waiter should wake on cancel")
            .unwrap();
    }

    #[tokio::test]
    async fn test_notified_after_cancel_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();
        token.notified().await;
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_handle_drop_cancels() {
        let token = Arc::new(CancelToken::new());
        {
            let _handle = ScheduleHandle::new(token.clone());
        }
        assert!(token.is_cancelled());
    }
}
