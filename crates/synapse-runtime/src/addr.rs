//! The caller-side address of an actor.
//!
//! An [`ActorAddr`] is the proxy handed to application code: every method
//! call on it becomes a mailbox letter addressed to the actor's partition,
//! and `call` returns the future the harness settles when the method
//! completes. Addresses are cheap to clone and safe to pass between actors
//! (including inside call arguments).

use crate::error::{Result, RuntimeError};
use crate::mailbox::Mailbox;
use crate::message::{ActorMessage, CallArgs, CallValue};
use std::any::Any;
use std::marker::PhantomData;
use std::ops::Deref;
use synapse_protocol::{ActorId, Message, Partition};

use crate::actor::Actor;

/// Enqueue a call and return its reply.
///
/// This is the single pathway every invocation goes through: it builds the
/// [`ActorMessage`] with a fresh reply channel, wraps it in a partition-keyed
/// envelope and pushes it into the mailbox. The returned future settles when
/// the target actor resolves or rejects the call; if the letter is dropped
/// without ever being dispatched the caller sees `ReplyDropped`.
pub async fn send_and_return(
    mailbox: &Mailbox,
    id: &ActorId,
    method: &str,
    args: CallArgs,
) -> Result<CallValue> {
    let (message, reply) = ActorMessage::call(method, args);
    mailbox.push(Message::new(Partition::from(id), message)).await;
    match reply.await {
        Ok(outcome) => outcome,
        Err(_) => Err(RuntimeError::ReplyDropped),
    }
}

/// Untyped address of an actor registered in a system.
#[derive(Clone)]
pub struct ActorAddr {
    id: ActorId,
    mailbox: Mailbox,
}

impl ActorAddr {
    pub(crate) fn new(id: ActorId, mailbox: Mailbox) -> Self {
        Self { id, mailbox }
    }

    /// The target actor's id.
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Invoke `method` and downcast the result to `R`.
    ///
    /// A handler returning a different type surfaces `ReplyTypeMismatch`.
    pub async fn call<R: Any>(&self, method: &str, args: CallArgs) -> Result<R> {
        let value = self.call_any(method, args).await?;
        value
            .downcast::<R>()
            .map(|boxed| *boxed)
            .map_err(|_| RuntimeError::ReplyTypeMismatch)
    }

    /// Invoke `method` and return the raw boxed result.
    pub async fn call_any(&self, method: &str, args: CallArgs) -> Result<CallValue> {
        send_and_return(&self.mailbox, &self.id, method, args).await
    }

    /// Invoke `method` without waiting for a result.
    ///
    /// Delivery problems are reported on the log, never to the caller.
    pub async fn tell(&self, method: &str, args: CallArgs) {
        let message = ActorMessage::tell(method, args);
        self.mailbox
            .push(Message::new(Partition::from(&self.id), message))
            .await;
    }

    /// Send the synthetic `set_property` message for a property write.
    ///
    /// Fire-and-forget: the write lands when the actor's dispatch handles
    /// `set_property(name, value)`. Actors that do not handle it reject the
    /// message into their own error path.
    pub async fn put(&self, name: &str, value: Box<dyn Any + Send + Sync>) {
        let args: CallArgs = std::sync::Arc::new(vec![
            Box::new(name.to_string()) as Box<dyn Any + Send + Sync>,
            value,
        ]);
        self.tell("set_property", args).await;
    }
}

impl std::fmt::Debug for ActorAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorAddr").field("id", &self.id).finish()
    }
}

/// Typed veneer over [`ActorAddr`] returned by `ActorSystem::actor_of`.
///
/// Keeps the spawned actor's type in the caller's hands without granting
/// access to its state; all interaction still goes through the address.
pub struct ActorHandle<A: Actor> {
    addr: ActorAddr,
    _actor: PhantomData<fn() -> A>,
}

impl<A: Actor> ActorHandle<A> {
    pub(crate) fn new(addr: ActorAddr) -> Self {
        Self {
            addr,
            _actor: PhantomData,
        }
    }

    /// The untyped address of this actor.
    pub fn addr(&self) -> &ActorAddr {
        &self.addr
    }
}

impl<A: Actor> Clone for ActorHandle<A> {
    fn clone(&self) -> Self {
        Self {
            addr: self.addr.clone(),
            _actor: PhantomData,
        }
    }
}

impl<A: Actor> Deref for ActorHandle<A> {
    type Target = ActorAddr;

    fn deref(&self) -> &ActorAddr {
        &self.addr
    }
}

impl<A: Actor> std::fmt::Debug for ActorHandle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorHandle").field("id", self.addr.id()).finish()
    }
}
