//! The call envelope carried inside mailbox messages.
//!
//! Every proxy invocation becomes an [`ActorMessage`]: a method name, a
//! shared argument list and (for calls, not tells) a one-shot reply channel.
//! The harness settles the reply exactly once — the sender is taken out of
//! its slot on the first resolve/reject, so a later settle is a no-op.

use crate::error::{Result, RuntimeError};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};
use synapse_protocol::Message;
use tokio::sync::oneshot;

/// Value produced by an actor method, downcast by the caller.
pub type CallValue = Box<dyn Any + Send>;

/// Error type actor methods are free to return.
pub type CallError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single dispatched method.
pub type CallResult = std::result::Result<CallValue, CallError>;

/// Argument list for a method invocation.
///
/// Arguments are shared behind an `Arc` so a supervisor-driven retry
/// re-dispatches the same list without cloning the values themselves.
pub type CallArgs = Arc<Vec<Box<dyn Any + Send + Sync>>>;

/// The mailbox letter: a partition-keyed envelope around an [`ActorMessage`].
pub type Letter = Message<ActorMessage>;

type ReplySender = oneshot::Sender<Result<CallValue>>;

/// Future side of a call's reply channel.
pub type ReplyReceiver = oneshot::Receiver<Result<CallValue>>;

/// Build an empty argument list.
pub fn no_args() -> CallArgs {
    Arc::new(Vec::new())
}

/// Downcast the argument at `index`, if present and of the right type.
pub fn arg<T: Any>(args: &CallArgs, index: usize) -> Option<&T> {
    args.get(index).and_then(|value| value.downcast_ref::<T>())
}

/// Build a [`CallArgs`] list from expressions.
///
/// ```ignore
/// let args = args!["hello".to_string(), 42u64];
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::message::no_args() };
    ($($value:expr),+ $(,)?) => {
        std::sync::Arc::new(vec![
            $(Box::new($value) as Box<dyn std::any::Any + Send + Sync>),+
        ])
    };
}

/// A serialized method invocation addressed to one actor.
pub struct ActorMessage {
    method: String,
    args: CallArgs,
    reply: Mutex<Option<ReplySender>>,
}

impl ActorMessage {
    /// Create a call message together with the receiver its reply settles.
    pub fn call(method: impl Into<String>, args: CallArgs) -> (Self, ReplyReceiver) {
        let (tx, rx) = oneshot::channel();
        let message = Self {
            method: method.into(),
            args,
            reply: Mutex::new(Some(tx)),
        };
        (message, rx)
    }

    /// Create a fire-and-forget message with no reply channel.
    pub fn tell(method: impl Into<String>, args: CallArgs) -> Self {
        Self {
            method: method.into(),
            args,
            reply: Mutex::new(None),
        }
    }

    /// The invoked method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// A shared handle on the argument list.
    pub fn args(&self) -> CallArgs {
        self.args.clone()
    }

    /// Settle the caller's reply with a value.
    ///
    /// The first settle wins; afterwards the message holds no sender and
    /// both `resolve` and `reject` become no-ops.
    pub fn resolve(&self, value: CallValue) {
        if let Some(tx) = self.take_reply() {
            if tx.send(Ok(value)).is_err() {
                tracing::debug!(method = %self.method, "reply receiver dropped before resolve");
            }
        }
    }

    /// Settle the caller's reply with an error.
    pub fn reject(&self, error: RuntimeError) {
        if let Some(tx) = self.take_reply() {
            if tx.send(Err(error)).is_err() {
                tracing::debug!(method = %self.method, "reply receiver dropped before reject");
            }
        }
    }

    fn take_reply(&self) -> Option<ReplySender> {
        match self.reply.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl fmt::Debug for ActorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorMessage")
            .field("method", &self.method)
            .field("args", &self.args.len())
            .finish()
    }
}
