//! Failure policies consulted by the actor harness.

use crate::error::RuntimeError;
use crate::message::ActorMessage;
use async_trait::async_trait;
use synapse_protocol::ActorId;

/// Outcome selected by a supervisor after a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Leave the message at the queue head; it is re-dispatched on the next
    /// poll and the caller's reply stays pending.
    RetryMessage,

    /// Discard the message and reject the caller's reply.
    DropMessage,

    /// Hand the failure up the chain; the chain root finalizes it by
    /// rejecting the caller.
    Escalate,
}

/// Policy object deciding what happens when a handler fails.
///
/// Every actor holds exactly one supervisor. Children spawned through
/// `ActorContext::actor_of` get their parent's cell, which delegates to the
/// parent's own supervisor — an escalation chain rooted at the supervisor
/// configured on the system.
#[async_trait]
pub trait Supervisor: Send + Sync {
    async fn supervise(
        &self,
        actor: &ActorId,
        error: &RuntimeError,
        message: &ActorMessage,
    ) -> Directive;
}

/// Terminal supervisor: every failure is finalized and the caller rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct EscalateSupervisor;

#[async_trait]
impl Supervisor for EscalateSupervisor {
    async fn supervise(
        &self,
        actor: &ActorId,
        error: &RuntimeError,
        message: &ActorMessage,
    ) -> Directive {
        tracing::debug!(
            actor = %actor,
            method = message.method(),
            error = %error,
            "escalating handler failure"
        );
        Directive::Escalate
    }
}
