//! The actor registry and its fiber-driven processing tick.

use crate::actor::{Actor, ActorCell, BoxActor};
use crate::addr::{ActorAddr, ActorHandle};
use crate::config::SystemConfig;
use crate::error::{Result, RuntimeError};
use crate::fiber::{Fiber, FiberConfig, Processor};
use crate::mailbox::Mailbox;
use crate::materializer::Materializer;
use crate::resolver::Resolver;
use crate::supervisor::Supervisor;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use synapse_protocol::{ActorId, SubscriptionId};
use tokio::sync::RwLock;

pub(crate) struct SystemInner {
    mailbox: Mailbox,
    fiber: Fiber,
    actors: RwLock<HashMap<ActorId, Arc<ActorCell>>>,
    subscriptions: RwLock<HashMap<ActorId, SubscriptionId>>,
    materializers: Arc<Vec<Arc<dyn Materializer>>>,
    resolvers: Vec<Arc<dyn Resolver>>,
    supervisor: Arc<dyn Supervisor>,
}

impl SystemInner {
    /// One tick: launch a poll for every registered actor's subscription.
    ///
    /// Polls are spawned, not awaited; a slow handler delays only its own
    /// actor. The busy flag keeps each actor single-in-flight even when
    /// polls from consecutive ticks overlap.
    async fn process(&self) {
        let subscriptions: Vec<SubscriptionId> =
            self.subscriptions.read().await.values().copied().collect();
        for subscription in subscriptions {
            let mailbox = self.mailbox.clone();
            tokio::spawn(async move {
                mailbox.poll(subscription).await;
            });
        }
    }

    /// Register an actor instance: build its cell, subscribe it to the
    /// mailbox, record it and run initialization hooks.
    ///
    /// Supervisor precedence: the actor's own override, then the spawning
    /// parent, then the system supervisor.
    pub(crate) async fn install(
        self: &Arc<Self>,
        actor: BoxActor,
        parent: Option<Arc<dyn Supervisor>>,
    ) -> Result<ActorAddr> {
        let id = actor.id();
        let supervisor = actor
            .supervisor()
            .or(parent)
            .unwrap_or_else(|| self.supervisor.clone());

        let cell = ActorCell::spawn(
            actor,
            Arc::downgrade(self),
            self.mailbox.clone(),
            self.materializers.clone(),
            supervisor,
        );

        {
            let mut actors = self.actors.write().await;
            if actors.contains_key(&id) {
                return Err(RuntimeError::DuplicateActor(id));
            }
            actors.insert(id.clone(), cell.clone());
        }

        let subscription = self.mailbox.add_subscriber(cell.clone()).await;
        self.subscriptions
            .write()
            .await
            .insert(id.clone(), subscription);

        cell.initialize().await;
        tracing::debug!(actor = %id, subscription = %subscription, "actor registered");
        Ok(cell.addr())
    }
}

/// Ticks the system from the fiber without keeping it alive.
struct SystemProcessor {
    inner: Weak<SystemInner>,
}

#[async_trait]
impl Processor for SystemProcessor {
    fn requirements(&self) -> Vec<String> {
        vec!["default".to_string()]
    }

    async fn process(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.process().await;
        }
    }
}

/// Owns the mailbox, the fiber and every registered actor.
///
/// Cloning is cheap; all clones address the same system. Dropping the last
/// clone stops the fiber.
#[derive(Clone)]
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

impl ActorSystem {
    /// Build a system from configuration and start its fiber.
    pub async fn with(config: SystemConfig) -> ActorSystem {
        let fiber = Fiber::with(FiberConfig {
            resources: config.resources.clone(),
            tick_interval: config.tick_interval,
        });

        let inner = Arc::new(SystemInner {
            mailbox: config.mailbox,
            fiber,
            actors: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            materializers: Arc::new(config.materializers),
            resolvers: config.resolvers,
            supervisor: config.supervisor,
        });

        let accepted = inner
            .fiber
            .acquire(Arc::new(SystemProcessor {
                inner: Arc::downgrade(&inner),
            }))
            .await;
        if !accepted {
            tracing::warn!("system processor rejected by fiber; mailboxes will not be drained");
        }

        ActorSystem { inner }
    }

    pub(crate) fn from_inner(inner: Arc<SystemInner>) -> Self {
        Self { inner }
    }

    /// Register an actor and return its typed handle.
    pub async fn actor_of<A: Actor>(&self, actor: A) -> Result<ActorHandle<A>> {
        let addr = self.inner.install(Box::new(actor), None).await?;
        Ok(ActorHandle::new(addr))
    }

    /// Locate an actor by id.
    ///
    /// Locally registered actors answer immediately with a fresh address.
    /// Unknown ids walk the resolver chain in registration order; the first
    /// resolved instance is installed like any other actor. When every
    /// resolver fails the call fails with `unable to resolve actor <id>`.
    pub async fn actor_for(&self, id: &ActorId) -> Result<ActorAddr> {
        if self.inner.actors.read().await.contains_key(id) {
            return Ok(ActorAddr::new(id.clone(), self.inner.mailbox.clone()));
        }

        for resolver in &self.inner.resolvers {
            match resolver.resolve_actor_by_id(id).await {
                Ok(actor) => return self.inner.install(actor, None).await,
                Err(error) => {
                    tracing::debug!(actor = %id, error = %error, "resolver declined");
                }
            }
        }

        Err(RuntimeError::UnresolvedActor(id.clone()))
    }

    /// `actor_for` with a local fallback: when resolution fails, register
    /// the actor produced by `fallback` instead.
    pub async fn resolve_or_new<A, F>(&self, id: &ActorId, fallback: F) -> Result<ActorAddr>
    where
        A: Actor,
        F: FnOnce() -> A,
    {
        match self.actor_for(id).await {
            Ok(addr) => Ok(addr),
            Err(_) => {
                let handle = self.actor_of(fallback()).await?;
                Ok(handle.addr().clone())
            }
        }
    }

    /// Run one processing tick by hand (the fiber calls this on every tick).
    pub async fn process(&self) {
        self.inner.process().await;
    }

    /// Stop the system: cancel per-actor timers, clear topic bookkeeping
    /// and stop the fiber.
    ///
    /// Yields once first so setups still in flight (deferred schedules,
    /// topic subscribes) complete before teardown.
    pub async fn free(&self) {
        tokio::task::yield_now().await;
        let cells: Vec<Arc<ActorCell>> = self.inner.actors.read().await.values().cloned().collect();
        for cell in cells {
            cell.release().await;
        }
        self.inner.fiber.free();
    }

    /// Whether `id` is registered locally.
    pub async fn contains(&self, id: &ActorId) -> bool {
        self.inner.actors.read().await.contains_key(id)
    }

    /// Number of registered actors.
    pub async fn len(&self) -> usize {
        self.inner.actors.read().await.len()
    }

    /// Whether no actors are registered.
    pub async fn is_empty(&self) -> bool {
        self.inner.actors.read().await.is_empty()
    }

    /// The mailbox shared by every actor in this system.
    pub fn mailbox(&self) -> &Mailbox {
        &self.inner.mailbox
    }
}
