//! The actor contract and its runtime harness.
//!
//! Application code implements [`Actor`]; the runtime wraps each instance in
//! a cell that registers it as a mailbox subscriber and enforces
//! single-in-flight dispatch.

mod cell;
mod context;

pub(crate) use cell::ActorCell;
pub use context::ActorContext;

use crate::message::{CallArgs, CallResult};
use crate::supervisor::Supervisor;
use async_trait::async_trait;
use std::sync::Arc;
use synapse_protocol::{ActorId, Partition};

/// A stateful unit that processes one method invocation at a time.
///
/// Method calls reach the actor as `(method, args)` pairs through
/// [`Actor::dispatch`], the statically-typed stand-in for dynamic method
/// lookup: match on the method name, downcast the arguments you expect and
/// return the boxed result. Returning `None` reports the method as missing
/// and rejects the caller with a `Method <name> not found` error.
///
/// # Example
///
/// ```rust,ignore
/// struct Counter {
///     id: ActorId,
///     count: u64,
/// }
///
/// #[async_trait::async_trait]
/// impl Actor for Counter {
///     fn id(&self) -> ActorId {
///         self.id.clone()
///     }
///
///     async fn dispatch(
///         &mut self,
///         _ctx: &ActorContext,
///         method: &str,
///         args: CallArgs,
///     ) -> Option<CallResult> {
///         match method {
///             "increment" => {
///                 self.count += arg::<u64>(&args, 0).copied().unwrap_or(1);
///                 Some(Ok(Box::new(self.count)))
///             }
///             "count" => Some(Ok(Box::new(self.count))),
///             _ => None,
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Actor: Send + 'static {
    /// This actor's unique id within the system.
    fn id(&self) -> ActorId;

    /// Mailbox partitions this actor receives from. Defaults to the single
    /// partition equal to the actor's id.
    fn partitions(&self) -> Vec<Partition> {
        vec![Partition::from(&self.id())]
    }

    /// Per-actor supervisor override. When `None`, failures go to the
    /// spawning parent's chain (or the system supervisor for top-level
    /// actors).
    fn supervisor(&self) -> Option<Arc<dyn Supervisor>> {
        None
    }

    /// Runs once the actor is fully registered, after materializers have
    /// observed `on_initialize`.
    async fn initialized(&mut self, _ctx: &ActorContext) {}

    /// Execute one named method. `None` means the method does not exist.
    async fn dispatch(
        &mut self,
        ctx: &ActorContext,
        method: &str,
        args: CallArgs,
    ) -> Option<CallResult>;
}

/// Type-erased actor instance, as produced by resolvers.
pub type BoxActor = Box<dyn Actor>;
