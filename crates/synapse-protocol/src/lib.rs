//! Envelope and routing types shared by the synapse actor runtime.
//!
//! This crate is deliberately small: it defines the identifiers used to
//! route messages (actors, partitions, subscriptions, schedules) and the
//! immutable `Message<T>` envelope the mailbox moves around. Everything
//! stateful lives in `synapse-runtime`.

pub mod message;
pub mod routing;

pub use message::Message;
pub use routing::{ActorId, Partition, ScheduleId, SubscriptionId};
