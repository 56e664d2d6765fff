//! Actor lookup chain for ids not registered locally.

use crate::actor::BoxActor;
use crate::error::Result;
use async_trait::async_trait;
use synapse_protocol::ActorId;

/// Produces an actor instance for an id the system does not know.
///
/// Resolvers are consulted in registration order; the first one that returns
/// `Ok` wins and its instance is installed into the local registry.
/// Failures are absorbed and the next resolver is tried; when every resolver
/// fails, `actor_for` surfaces `unable to resolve actor <id>`.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve_actor_by_id(&self, id: &ActorId) -> Result<BoxActor>;
}
