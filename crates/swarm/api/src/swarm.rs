//! The swarm core capability.

use async_trait::async_trait;
use meridian_swarm_peer::{AddressRecord, Identifier};
use tokio_util::sync::CancellationToken;

use crate::CoreError;

/// Membership and routing logic behind the swarm service.
///
/// The service validates and decodes requests, then delegates here. A core
/// decides whether an advertised record is accepted and which known peers are
/// closest to an identifier. Implementations must be safe to call from many
/// concurrent request handlers.
#[async_trait]
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait SwarmCore: Send + Sync {
    /// Handle an unsolicited address advertisement from `record`'s owner.
    async fn ping(&self, cancel: &CancellationToken, record: AddressRecord)
    -> Result<(), CoreError>;

    /// Handle an address advertisement sent in reply to our own ping.
    async fn pong(&self, cancel: &CancellationToken, record: AddressRecord)
    -> Result<(), CoreError>;

    /// Known records closest to `target`, closest first.
    ///
    /// An unknown target is not an error.
    async fn query(
        &self,
        cancel: &CancellationToken,
        target: &Identifier,
    ) -> Result<Vec<AddressRecord>, CoreError>;
}
