//! Routing identifiers for the actor runtime.
//!
//! Three kinds of names flow through the system:
//! - `ActorId` / `Partition`: author-chosen strings. An actor's default
//!   partition is its own id, so unicast delivery is just pub/sub with a
//!   single well-known partition.
//! - `SubscriptionId` / `ScheduleId`: runtime-generated random 64-bit ids,
//!   displayed as zero-padded hex.

use std::fmt;
use std::sync::Arc;

/// Unique identifier for an actor within a system.
///
/// Ids are chosen by the actor author and must be unique within one
/// `ActorSystem`. Topic actors live under the reserved `topics/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(Arc<str>);

impl ActorId {
    /// Create an actor id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(Arc::from(id.into()))
    }

    /// Get the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routing key used by the mailbox.
///
/// By default an actor subscribes to the single partition equal to its id;
/// actors may declare additional partitions to receive broadcast traffic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition(Arc<str>);

impl Partition {
    /// Create a partition from any string-like value.
    pub fn new(partition: impl Into<String>) -> Self {
        Self(Arc::from(partition.into()))
    }

    /// Get the raw partition string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Partition {
    fn from(partition: &str) -> Self {
        Self::new(partition)
    }
}

impl From<&ActorId> for Partition {
    fn from(id: &ActorId) -> Self {
        Self(id.0.clone())
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a mailbox subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Generate a fresh random subscription id.
    pub fn new() -> Self {
        Self(rand::random())
    }

    /// Create a subscription id from a specific value.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Cancellation token identifier for a scheduled send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleId(u64);

impl ScheduleId {
    /// Generate a fresh random schedule id.
    pub fn new() -> Self {
        Self(rand::random())
    }

    /// Create a schedule id from a specific value.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ScheduleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_display() {
        let id = ActorId::new("worker/7");
        assert_eq!(id.as_str(), "worker/7");
        assert_eq!(format!("{}", id), "worker/7");
    }

    #[test]
    fn test_default_partition_equals_id() {
        let id = ActorId::new("counter");
        let partition = Partition::from(&id);
        assert_eq!(partition.as_str(), id.as_str());
    }

    #[test]
    fn test_partition_equality() {
        assert_eq!(Partition::new("1"), Partition::from("1"));
        assert_ne!(Partition::new("1"), Partition::new("2"));
    }

    #[test]
    fn test_subscription_id_creation() {
        let id1 = SubscriptionId::new();
        let id2 = SubscriptionId::new();
        // Random ids should be different
        assert_ne!(id1, id2);

        let id3 = SubscriptionId::from_u64(42);
        assert_eq!(id3.as_u64(), 42);
    }

    #[test]
    fn test_subscription_id_display() {
        let id = SubscriptionId::from_u64(0x123abc);
        assert_eq!(format!("{}", id), "0000000000123abc");
    }

    #[test]
    fn test_schedule_id_display() {
        let id = ScheduleId::from_u64(0xfeed);
        assert_eq!(format!("{}", id), "000000000000feed");
    }
}
