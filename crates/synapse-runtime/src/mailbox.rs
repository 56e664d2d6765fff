//! Partition-indexed message queues and the subscriber registry.
//!
//! The mailbox routes every pushed letter to all subscriptions registered on
//! the letter's partition (broadcast within a partition). Each subscription
//! owns an independent FIFO queue; `poll` processes at most one queued
//! letter per subscription per call, which is what gives the actor harness
//! its retry semantics — a subscriber declining a letter leaves it at the
//! head for the next poll.

use crate::message::Letter;
use crate::metrics::MailboxMetrics;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use synapse_protocol::{Partition, SubscriptionId};
use tokio::sync::Mutex;

/// A consumer of mailbox letters.
///
/// Implementors declare the partitions they are interested in once, at
/// registration time. `on_receive_message` returns `true` when the letter
/// was consumed and `false` to leave it queued for the next poll.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Partitions this subscriber wants letters from.
    fn partitions(&self) -> Vec<Partition>;

    /// Handle one letter; `false` keeps it at the queue head.
    async fn on_receive_message(&self, letter: Arc<Letter>) -> bool;
}

/// One per-partition FIFO bound to a subscriber.
struct Subscription {
    id: SubscriptionId,
    subscriber: Arc<dyn Subscriber>,
    queue: Mutex<VecDeque<Arc<Letter>>>,
    /// Serializes processing so concurrent polls cannot double-deliver the
    /// same head. Taken with try_lock: an overlapping poll skips instead of
    /// queueing behind a slow handler.
    gate: Mutex<()>,
}

impl Subscription {
    fn new(id: SubscriptionId, subscriber: Arc<dyn Subscriber>) -> Self {
        Self {
            id,
            subscriber,
            queue: Mutex::new(VecDeque::new()),
            gate: Mutex::new(()),
        }
    }

    async fn process(&self, metrics: &MailboxMetrics) {
        let Ok(_gate) = self.gate.try_lock() else {
            return;
        };

        let head = { self.queue.lock().await.front().cloned() };
        let Some(letter) = head else {
            return;
        };

        if self.subscriber.on_receive_message(letter).await {
            self.queue.lock().await.pop_front();
            metrics.record_delivery();
        } else {
            metrics.record_retry();
        }
    }
}

#[derive(Default)]
struct MailboxState {
    partitions: HashMap<Partition, Vec<Arc<Subscription>>>,
    index: HashMap<SubscriptionId, Vec<Partition>>,
}

/// Routes messages to interested subscribers by partition.
///
/// Cheap to clone; all clones share the same queues and registry.
#[derive(Clone, Default)]
pub struct Mailbox {
    inner: Arc<MailboxInner>,
}

#[derive(Default)]
struct MailboxInner {
    state: Mutex<MailboxState>,
    metrics: MailboxMetrics,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber on every partition it declares.
    ///
    /// Each partition gets its own [`Subscription`] instance with an
    /// independent queue; they share the subscriber reference and the
    /// returned id.
    pub async fn add_subscriber(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId::new();
        let partitions = subscriber.partitions();

        let mut state = self.inner.state.lock().await;
        for partition in &partitions {
            let subscription = Arc::new(Subscription::new(id, subscriber.clone()));
            state
                .partitions
                .entry(partition.clone())
                .or_default()
                .push(subscription);
        }
        state.index.insert(id, partitions);
        id
    }

    /// Remove every subscription registered under `id`.
    ///
    /// Unknown ids are a no-op; any letters still queued under the removed
    /// subscriptions are dropped with them.
    pub async fn remove_subscription(&self, id: SubscriptionId) {
        let mut state = self.inner.state.lock().await;
        let Some(partitions) = state.index.remove(&id) else {
            return;
        };
        for partition in partitions {
            if let Some(bucket) = state.partitions.get_mut(&partition) {
                bucket.retain(|subscription| subscription.id != id);
                if bucket.is_empty() {
                    state.partitions.remove(&partition);
                }
            }
        }
    }

    /// Append a letter to the queue of every subscription on its partition.
    ///
    /// A partition with no subscriptions drops the letter: its reply channel
    /// (if any) is released, so a waiting caller sees the drop.
    pub async fn push(&self, letter: Letter) {
        let letter = Arc::new(letter);
        let state = self.inner.state.lock().await;
        let Some(bucket) = state.partitions.get(letter.partition()) else {
            tracing::warn!(
                partition = %letter.partition(),
                "message pushed to a partition with no subscriptions"
            );
            self.inner.metrics.record_dead_letter();
            return;
        };
        for subscription in bucket {
            subscription.queue.lock().await.push_back(letter.clone());
        }
        self.inner.metrics.record_push();
    }

    /// Process at most one queued letter on each subscription under `id`.
    ///
    /// Unknown ids return without work.
    pub async fn poll(&self, id: SubscriptionId) {
        let subscriptions = {
            let state = self.inner.state.lock().await;
            let Some(partitions) = state.index.get(&id) else {
                return;
            };
            let mut matched = Vec::new();
            for partition in partitions {
                if let Some(bucket) = state.partitions.get(partition) {
                    matched.extend(
                        bucket
                            .iter()
                            .filter(|subscription| subscription.id == id)
                            .cloned(),
                    );
                }
            }
            matched
        };

        for subscription in subscriptions {
            subscription.process(&self.inner.metrics).await;
        }
    }

    /// Number of subscriptions currently registered on a partition.
    pub async fn subscriber_count(&self, partition: &Partition) -> usize {
        self.inner
            .state
            .lock()
            .await
            .partitions
            .get(partition)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Delivery counters for this mailbox.
    pub fn metrics(&self) -> &MailboxMetrics {
        &self.inner.metrics
    }
}
