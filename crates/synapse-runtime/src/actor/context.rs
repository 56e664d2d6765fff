//! Per-actor execution context.
//!
//! Handlers receive an `ActorContext` alongside the method arguments. It
//! carries the actor's own address, a handle back to the owning system, the
//! scheduled-timer map and the topic-subscription map. Both maps belong to
//! this actor alone and are cleared when the system is freed.

use crate::actor::{Actor, ActorCell};
use crate::addr::ActorAddr;
use crate::error::{Result, RuntimeError};
use crate::message::CallArgs;
use crate::scheduler::{CancelToken, ScheduleHandle};
use crate::supervisor::Supervisor;
use crate::system::{ActorSystem, SystemInner};
use crate::topic::Topic;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use synapse_protocol::{ActorId, ScheduleId, SubscriptionId};
use tokio::sync::Mutex;

pub struct ActorContext {
    id: ActorId,
    addr: ActorAddr,
    system: Weak<SystemInner>,
    cell: Weak<ActorCell>,
    timers: Arc<Mutex<HashMap<ScheduleId, ScheduleHandle>>>,
    topic_subscriptions: Arc<Mutex<HashMap<ActorId, SubscriptionId>>>,
}

impl ActorContext {
    pub(crate) fn new(
        id: ActorId,
        addr: ActorAddr,
        system: Weak<SystemInner>,
        cell: Weak<ActorCell>,
    ) -> Self {
        Self {
            id,
            addr,
            system,
            cell,
            timers: Arc::new(Mutex::new(HashMap::new())),
            topic_subscriptions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// This actor's id.
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// This actor's own address; calls through it go through the mailbox
    /// like any other caller's.
    pub fn addr(&self) -> &ActorAddr {
        &self.addr
    }

    /// The owning system. Fails once the system has been dropped.
    pub fn system(&self) -> Result<ActorSystem> {
        self.system
            .upgrade()
            .map(ActorSystem::from_inner)
            .ok_or(RuntimeError::SystemFreed)
    }

    /// Spawn a child actor.
    ///
    /// The child's failures escalate to this actor's supervisor chain unless
    /// the child overrides its own supervisor.
    pub async fn actor_of(&self, child: impl Actor) -> Result<ActorAddr> {
        let system = self.system.upgrade().ok_or(RuntimeError::SystemFreed)?;
        let parent = self.cell.upgrade().ok_or(RuntimeError::SystemFreed)?;
        system
            .install(Box::new(child), Some(parent as Arc<dyn Supervisor>))
            .await
    }

    /// Send `method`/`args` to this actor every `interval`.
    ///
    /// The first firing happens one interval after registration completes
    /// (the timer yields once before arming, so a schedule issued during
    /// spawn only starts sending when the actor is reachable). Returns a
    /// cancellation id.
    pub async fn schedule(&self, interval: Duration, method: &str, args: CallArgs) -> ScheduleId {
        let id = ScheduleId::new();
        let token = Arc::new(CancelToken::new());
        self.timers
            .lock()
            .await
            .insert(id, ScheduleHandle::new(token.clone()));

        let addr = self.addr.clone();
        let method = method.to_string();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        if token.is_cancelled() {
                            break;
                        }
                        addr.tell(&method, args.clone()).await;
                    }
                    _ = token.notified() => break,
                }
            }
        });
        id
    }

    /// Send `method`/`args` to this actor once, after `timeout`.
    ///
    /// The timer removes its own map entry after the single firing.
    pub async fn schedule_once(
        &self,
        timeout: Duration,
        method: &str,
        args: CallArgs,
    ) -> ScheduleId {
        let id = ScheduleId::new();
        let token = Arc::new(CancelToken::new());
        self.timers
            .lock()
            .await
            .insert(id, ScheduleHandle::new(token.clone()));

        let addr = self.addr.clone();
        let method = method.to_string();
        let timers = self.timers.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    if !token.is_cancelled() {
                        addr.tell(&method, args).await;
                    }
                }
                _ = token.notified() => {}
            }
            timers.lock().await.remove(&id);
        });
        id
    }

    /// Stop a scheduled send. Unknown ids are no-ops.
    pub async fn cancel(&self, id: ScheduleId) {
        if let Some(handle) = self.timers.lock().await.remove(&id) {
            handle.cancel();
        }
    }

    /// Join a topic with this actor's address.
    ///
    /// Yields once first so a subscribe issued during spawn completes after
    /// registration. Subscribing again to the same topic overwrites the
    /// stored id and orphans the previous subscription; unsubscribe first if
    /// that matters.
    pub async fn subscribe_to_topic<P>(&self, topic: &Topic<P>) -> Result<()> {
        tokio::task::yield_now().await;
        let subscription = topic.subscribe(self.addr.clone()).await?;
        let previous = self
            .topic_subscriptions
            .lock()
            .await
            .insert(topic.id().clone(), subscription);
        if let Some(orphaned) = previous {
            tracing::warn!(
                actor = %self.id,
                topic = %topic.id(),
                subscription = %orphaned,
                "duplicate topic subscribe orphaned the previous subscription"
            );
        }
        Ok(())
    }

    /// Leave a topic. A topic this actor never joined is a no-op.
    pub async fn unsubscribe_from_topic<P>(&self, topic: &Topic<P>) -> Result<()> {
        let subscription = self.topic_subscriptions.lock().await.remove(topic.id());
        match subscription {
            Some(subscription) => topic.unsubscribe(subscription).await,
            None => Ok(()),
        }
    }

    /// Cancel every timer and drop all topic bookkeeping.
    pub(crate) async fn release(&self) {
        let mut timers = self.timers.lock().await;
        for (_, handle) in timers.drain() {
            handle.cancel();
        }
        drop(timers);
        self.topic_subscriptions.lock().await.clear();
    }
}
