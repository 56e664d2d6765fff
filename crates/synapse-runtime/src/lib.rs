//! In-process actor runtime.
//!
//! Actors are stateful units that communicate only through asynchronous,
//! serialized method invocations and pub/sub topics:
//! - The [`Mailbox`] queues partition-keyed letters per subscription
//! - The [`Fiber`] ticks the system, which polls every actor's subscription
//! - The actor harness enforces at-most-one in-flight message per actor and
//!   fans out [`Materializer`] hooks around each dispatch
//! - [`ActorAddr`] turns method calls into letters with future replies
//! - [`Topic`] fans one invocation out to many subscribers
//! - [`Resolver`]s locate actors the system does not know locally
//!
//! # Example
//!
//! ```rust,ignore
//! let system = ActorSystem::with(SystemConfig::default()).await;
//! let counter = system.actor_of(Counter::new("counter")).await?;
//! let count: u64 = counter.call("increment", args![5u64]).await?;
//! ```

pub mod actor;
pub mod addr;
pub mod config;
pub mod error;
pub mod fiber;
pub mod mailbox;
pub mod materializer;
pub mod message;
pub mod metrics;
pub mod resolver;
pub mod scheduler;
pub mod supervisor;
pub mod system;
pub mod topic;

pub use actor::{Actor, ActorContext, BoxActor};
pub use addr::{send_and_return, ActorAddr, ActorHandle};
pub use config::{SystemConfig, SystemSettings};
pub use error::{Result, RuntimeError};
pub use fiber::{Fiber, FiberConfig, Processor};
pub use mailbox::{Mailbox, Subscriber};
pub use materializer::Materializer;
pub use message::{arg, no_args, ActorMessage, CallArgs, CallError, CallResult, CallValue, Letter};
pub use metrics::MailboxMetrics;
pub use resolver::Resolver;
pub use scheduler::ScheduleHandle;
pub use supervisor::{Directive, EscalateSupervisor, Supervisor};
pub use system::ActorSystem;
pub use topic::Topic;

// Envelope and routing types
pub use synapse_protocol::{ActorId, Message, Partition, ScheduleId, SubscriptionId};
