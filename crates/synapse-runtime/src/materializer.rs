//! Observation hooks invoked around message processing.

use crate::error::RuntimeError;
use crate::message::ActorMessage;
use async_trait::async_trait;
use synapse_protocol::ActorId;

/// Lifecycle observer attached to every actor in a system.
///
/// All hooks are fire-and-forget: the harness awaits them but swallows any
/// panic they raise, so a misbehaving materializer can never abort message
/// processing. Defaults are no-ops; implement only what you need.
#[async_trait]
pub trait Materializer: Send + Sync {
    /// The actor finished registering with the system.
    async fn on_initialize(&self, _actor: &ActorId) {}

    /// A message is about to be dispatched.
    async fn on_before_message(&self, _actor: &ActorId, _message: &ActorMessage) {}

    /// Dispatch finished, successfully or not.
    async fn on_after_message(&self, _actor: &ActorId, _message: &ActorMessage) {}

    /// Dispatch failed; fires before the supervisor is consulted.
    async fn on_error(&self, _actor: &ActorId, _message: &ActorMessage, _error: &RuntimeError) {}
}
