//! Mailbox delivery counters for monitoring and tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters tracking what the mailbox did with pushed messages.
#[derive(Debug, Default)]
pub struct MailboxMetrics {
    /// Messages accepted by `push`
    pushed: AtomicU64,

    /// Messages consumed by a subscriber (poll returned true)
    delivered: AtomicU64,

    /// Deliveries declined by a busy subscriber (poll returned false)
    retried: AtomicU64,

    /// Messages pushed to a partition with no subscriptions
    dead_lettered: AtomicU64,
}

impl MailboxMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_push(&self) {
        self.pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dead_letter(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    /// Total messages accepted by `push`.
    pub fn pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Total messages consumed by subscribers.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Total deliveries left queued for a later poll.
    pub fn retried(&self) -> u64 {
        self.retried.load(Ordering::Relaxed)
    }

    /// Total messages dropped for lack of subscriptions.
    pub fn dead_lettered(&self) -> u64 {
        self.dead_lettered.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = MailboxMetrics::new();

        metrics.record_push();
        metrics.record_push();
        metrics.record_delivery();
        metrics.record_retry();
        metrics.record_dead_letter();

        assert_eq!(metrics.pushed(), 2);
        assert_eq!(metrics.delivered(), 1);
        assert_eq!(metrics.retried(), 1);
        assert_eq!(metrics.dead_lettered(), 1);
    }
}
