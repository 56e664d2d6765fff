//! One-to-many method fan-out built on a plain actor.
//!
//! A topic is itself an actor registered at `topics/<name>`. Its state is a
//! map of subscription id to subscriber address; `notify` forwards a method
//! invocation to every subscriber through the normal proxy pathway, so each
//! delivery lands in that subscriber's own mailbox.

use crate::actor::{Actor, ActorContext};
use crate::addr::ActorAddr;
use crate::error::Result;
use crate::message::{arg, no_args, CallArgs, CallResult};
use crate::system::ActorSystem;
use async_trait::async_trait;
use std::collections::HashMap;
use std::marker::PhantomData;
use synapse_protocol::{ActorId, SubscriptionId};

/// The actor holding a topic's subscriber map.
struct TopicActor {
    id: ActorId,
    subscribers: HashMap<SubscriptionId, ActorAddr>,
}

#[async_trait]
impl Actor for TopicActor {
    fn id(&self) -> ActorId {
        self.id.clone()
    }

    async fn dispatch(
        &mut self,
        _ctx: &ActorContext,
        method: &str,
        args: CallArgs,
    ) -> Option<CallResult> {
        match method {
            "subscribe" => {
                let Some(subscriber) = arg::<ActorAddr>(&args, 0) else {
                    return Some(Err("subscribe expects an actor address".into()));
                };
                let subscription = SubscriptionId::new();
                self.subscribers.insert(subscription, subscriber.clone());
                Some(Ok(Box::new(subscription)))
            }
            "unsubscribe" => {
                // Unknown ids are a no-op
                if let Some(subscription) = arg::<SubscriptionId>(&args, 0) {
                    self.subscribers.remove(subscription);
                }
                Some(Ok(Box::new(())))
            }
            "notify" => {
                let Some(target) = arg::<String>(&args, 0) else {
                    return Some(Err("notify expects a method name".into()));
                };
                let forwarded = arg::<CallArgs>(&args, 1).cloned().unwrap_or_else(no_args);
                for subscriber in self.subscribers.values() {
                    subscriber.tell(target, forwarded.clone()).await;
                }
                Some(Ok(Box::new(())))
            }
            _ => None,
        }
    }
}

/// Handle on a pub/sub topic, typed by a user-declared protocol marker `P`.
///
/// The marker documents the set of method names subscribers are expected to
/// handle; enforcement happens receiver-side, in each subscriber's own
/// dispatch.
pub struct Topic<P> {
    addr: ActorAddr,
    _protocol: PhantomData<fn() -> P>,
}

impl<P> Topic<P> {
    /// Create the topic actor `topics/<name>` in the given system.
    pub async fn new(system: &ActorSystem, name: &str) -> Result<Topic<P>> {
        let handle = system
            .actor_of(TopicActor {
                id: ActorId::new(format!("topics/{name}")),
                subscribers: HashMap::new(),
            })
            .await?;
        Ok(Topic {
            addr: handle.addr().clone(),
            _protocol: PhantomData,
        })
    }

    /// The topic actor's id (`topics/<name>`).
    pub fn id(&self) -> &ActorId {
        self.addr.id()
    }

    /// Register a subscriber address; returns the id to unsubscribe with.
    pub async fn subscribe(&self, subscriber: ActorAddr) -> Result<SubscriptionId> {
        self.addr
            .call::<SubscriptionId>("subscribe", crate::args![subscriber])
            .await
    }

    /// Remove a subscription. Unknown ids are a no-op.
    pub async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<()> {
        self.addr
            .call::<()>("unsubscribe", crate::args![subscription])
            .await
    }

    /// Fan `method`/`args` out to every subscriber, fire-and-forget.
    ///
    /// No result is awaited or aggregated; subscribers receive the
    /// invocation in their own mailboxes in map iteration order.
    pub async fn notify(&self, method: &str, args: CallArgs) {
        self.addr
            .tell("notify", crate::args![method.to_string(), args])
            .await;
    }
}

impl<P> Clone for Topic<P> {
    fn clone(&self) -> Self {
        Self {
            addr: self.addr.clone(),
            _protocol: PhantomData,
        }
    }
}

impl<P> std::fmt::Debug for Topic<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic").field("id", self.addr.id()).finish()
    }
}
