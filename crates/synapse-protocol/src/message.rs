//! The partition-keyed message envelope.

use crate::routing::Partition;

/// Immutable envelope routed by partition.
///
/// A `Message` pairs a routing partition with an arbitrary content payload.
/// The mailbox delivers it to every subscription registered on that
/// partition. Fields are private; the envelope cannot be mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct Message<T> {
    partition: Partition,
    content: T,
}

impl<T> Message<T> {
    /// Create a new envelope for the given partition.
    pub fn new(partition: Partition, content: T) -> Self {
        Self { partition, content }
    }

    /// The partition this message is routed to.
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// The message payload.
    pub fn content(&self) -> &T {
        &self.content
    }

    /// Consume the envelope and return the payload.
    pub fn into_content(self) -> T {
        self.content
    }
}
