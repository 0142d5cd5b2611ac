//! The outbound swarm client capability.

use async_trait::async_trait;
use meridian_swarm_peer::{AddressRecord, Identifier, MultiAddress};
use tokio_util::sync::CancellationToken;

use crate::SwarmError;

/// Outbound discovery calls to remote peers.
///
/// Every call except [`self_address`](Self::self_address) opens one
/// connection to `to`, performs one logical request and releases the
/// connection before returning.
#[async_trait]
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait SwarmClient: Send + Sync {
    /// Advertise `self_address` to `to`.
    ///
    /// Fails with [`SwarmError::InvalidAddress`] before any network activity
    /// if `self_address` is empty.
    async fn ping(
        &self,
        cancel: &CancellationToken,
        to: &MultiAddress,
        self_address: &AddressRecord,
    ) -> Result<(), SwarmError>;

    /// Reply to a ping from `to` with the locally stored own record.
    async fn pong(&self, cancel: &CancellationToken, to: &MultiAddress) -> Result<(), SwarmError>;

    /// Ask `to` for the records it knows closest to `target`.
    ///
    /// Malformed entries in the response are dropped; the remaining records
    /// keep the remote's order.
    async fn query(
        &self,
        cancel: &CancellationToken,
        to: &MultiAddress,
        target: &Identifier,
    ) -> Result<Vec<AddressRecord>, SwarmError>;

    /// The local node's own record, or the empty record if unavailable.
    fn self_address(&self) -> AddressRecord;
}
