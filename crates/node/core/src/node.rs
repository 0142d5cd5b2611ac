//! Assembly of a discovery node.
//!
//! A [`SwarmNode`] wires one address store into both halves of the protocol:
//! the outbound [`SwarmRpcClient`] reads the node's own record from it, and the
//! inbound [`SwarmService`] writes accepted peer records to it through
//! [`KademliaCore`]. The node serves on a [`LoopbackNetwork`].

use std::sync::Arc;

use meridian_net_backoff::{Backoff, BackoffConfig};
use meridian_net_dialer::TimeoutDialer;
use meridian_net_peer_store::{AddressStore, InsertOutcome, MemoryAddressStore, StoreError};
use meridian_swarm_api::{CancellationToken, SwarmClient, SwarmError};
use meridian_swarm_peer::{
    AddressRecord, AddressSigner, EcdsaSigner, EcdsaVerifier, Identifier, MultiAddress,
    Multiaddr, RecordError,
};
use meridian_swarm_rpc::{LoopbackDialer, LoopbackNetwork, SwarmRpcClient, SwarmService};
use meridian_swarm_topology::KademliaCore;
use tracing::info;

use crate::NodeConfig;

pub type NodeStore = Arc<MemoryAddressStore<AddressRecord>>;
pub type NodeClient = SwarmRpcClient<TimeoutDialer<LoopbackDialer>, NodeStore>;
pub type NodeCore = KademliaCore<NodeStore, EcdsaVerifier>;
pub type NodeService = SwarmService<Arc<NodeCore>>;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("cannot sign local address: {0}")]
    Record(#[from] RecordError),
    #[error("cannot store local address: {0}")]
    Store(#[from] StoreError),
    #[error("nonce {received} does not supersede current nonce {current}")]
    StaleNonce { current: u64, received: u64 },
}

/// Builder for [`SwarmNode`].
pub struct SwarmNodeBuilder<'a> {
    config: &'a NodeConfig,
    signer: EcdsaSigner,
    transport: Multiaddr,
    nonce: u64,
}

impl<'a> SwarmNodeBuilder<'a> {
    /// Nonce of the initial self record. Defaults to 1.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sign the local record, assemble the node and register it on `network`.
    pub fn build(self, network: &LoopbackNetwork) -> Result<SwarmNode, NodeError> {
        let identifier = self.signer.identifier();
        let address = MultiAddress::new(self.transport, identifier.clone());
        let record = AddressRecord::signed(address.clone(), self.nonce, &self.signer)?;

        let store: NodeStore = Arc::new(MemoryAddressStore::new());
        store.insert(record)?;

        let dialer = TimeoutDialer::new(network.dialer(address.to_string()), self.config.dial.timeout());
        let client = Arc::new(SwarmRpcClient::new(
            identifier.clone(),
            store.clone(),
            dialer,
            Backoff::new(self.config.backoff.to_backoff_config()),
        ));

        // Reciprocal pongs run inside the ping handler: one attempt, short dial.
        let responder_dial = self
            .config
            .dial
            .timeout()
            .min(self.config.topology.reciprocate_timeout());
        let responder = Arc::new(SwarmRpcClient::new(
            identifier.clone(),
            store.clone(),
            TimeoutDialer::new(network.dialer(address.to_string()), responder_dial),
            Backoff::new(BackoffConfig::no_retry()),
        ));

        let core = Arc::new(
            KademliaCore::new(
                identifier,
                store.clone(),
                EcdsaVerifier,
                self.config.topology.to_topology_config(),
            )
            .with_responder(responder),
        );
        let service = Arc::new(
            SwarmService::new(core.clone())
                .with_rate_limit(self.config.rate_limit.to_rate_limiter_config()),
        );
        network.register(address.clone(), service.clone());

        info!(%address, nonce = self.nonce, "node started");
        Ok(SwarmNode {
            signer: self.signer,
            address,
            store,
            client,
            core,
            service,
        })
    }
}

/// A discovery node serving on a loopback network.
pub struct SwarmNode {
    signer: EcdsaSigner,
    address: MultiAddress,
    store: NodeStore,
    client: Arc<NodeClient>,
    core: Arc<NodeCore>,
    service: Arc<NodeService>,
}

impl SwarmNode {
    pub fn builder(config: &NodeConfig, signer: EcdsaSigner, transport: Multiaddr) -> SwarmNodeBuilder<'_> {
        SwarmNodeBuilder {
            config,
            signer,
            transport,
            nonce: 1,
        }
    }

    pub fn identifier(&self) -> Identifier {
        self.signer.identifier()
    }

    pub fn address(&self) -> &MultiAddress {
        &self.address
    }

    /// The node's current self record.
    pub fn record(&self) -> AddressRecord {
        self.client.self_address()
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn client(&self) -> &Arc<NodeClient> {
        &self.client
    }

    pub fn core(&self) -> &Arc<NodeCore> {
        &self.core
    }

    pub fn service(&self) -> &Arc<NodeService> {
        &self.service
    }

    /// Re-sign the self record at `nonce`, superseding the current one.
    pub fn readvertise(&self, nonce: u64) -> Result<AddressRecord, NodeError> {
        let record = AddressRecord::signed(self.address.clone(), nonce, &self.signer)?;
        if let InsertOutcome::Stale { current } = self.store.insert(record.clone())? {
            return Err(NodeError::StaleNonce {
                current,
                received: nonce,
            });
        }
        Ok(record)
    }

    /// Advertise the self record to `to`.
    pub async fn ping(&self, cancel: &CancellationToken, to: &MultiAddress) -> Result<(), SwarmError> {
        self.client.ping(cancel, to, &self.record()).await
    }

    /// Ask `to` for the peers closest to `target`.
    pub async fn query(
        &self,
        cancel: &CancellationToken,
        to: &MultiAddress,
        target: &Identifier,
    ) -> Result<Vec<AddressRecord>, SwarmError> {
        self.client.query(cancel, to, target).await
    }

    /// Records known to this node, including its own.
    pub fn known_peers(&self) -> Result<usize, StoreError> {
        self.store.len()
    }
}
