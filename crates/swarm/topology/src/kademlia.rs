use std::sync::Arc;

use async_trait::async_trait;
use meridian_net_peer_store::{AddressStore, InsertOutcome};
use meridian_swarm_api::{CancellationToken, CoreError, SwarmClient, SwarmCore};
use meridian_swarm_peer::{AddressRecord, AddressVerifier, Identifier, MultiAddress};
use tracing::{debug, info, warn};

use crate::{TopologyConfig, sort_by_distance};

/// Swarm core backed by an address store.
///
/// Ping and pong share one acceptance rule: the record must be well formed,
/// must not advertise the local node, must carry a valid signature and must
/// not be older than what the store already holds.
pub struct KademliaCore<S, V> {
    /// Local node's identifier.
    local: Identifier,

    store: S,

    verifier: V,

    config: TopologyConfig,

    /// Client used to pong ping senders.
    responder: Option<Arc<dyn SwarmClient>>,
}

impl<S, V> KademliaCore<S, V>
where
    S: AddressStore<AddressRecord>,
    V: AddressVerifier,
{
    pub fn new(local: Identifier, store: S, verifier: V, config: TopologyConfig) -> Self {
        Self {
            local,
            store,
            verifier,
            config,
            responder: None,
        }
    }

    /// Attach the client used to reciprocate pings.
    pub fn with_responder(mut self, responder: Arc<dyn SwarmClient>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn local(&self) -> &Identifier {
        &self.local
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    fn accept(&self, record: AddressRecord) -> Result<InsertOutcome, CoreError> {
        record.validate().map_err(CoreError::InvalidRecord)?;

        if record.identifier() == &self.local {
            return Err(CoreError::SelfAddress);
        }

        self.verifier.verify(&record)?;

        let received = record.nonce();
        match self.store.insert(record)? {
            InsertOutcome::Stale { current } => Err(CoreError::StaleNonce { current, received }),
            outcome => Ok(outcome),
        }
    }

    async fn reciprocate(&self, cancel: &CancellationToken, to: &MultiAddress) {
        let Some(responder) = self.responder.as_ref() else {
            return;
        };

        let timeout = self.config.reciprocate_timeout;
        match tokio::time::timeout(timeout, responder.pong(cancel, to)).await {
            Ok(Ok(())) => debug!(%to, "reciprocal pong delivered"),
            Ok(Err(err)) if err.is_cancelled() => debug!(%to, "reciprocal pong cancelled"),
            Ok(Err(err)) => warn!(%to, %err, "reciprocal pong failed"),
            Err(_) => warn!(%to, ?timeout, "reciprocal pong timed out"),
        }
    }
}

#[async_trait]
impl<S, V> SwarmCore for KademliaCore<S, V>
where
    S: AddressStore<AddressRecord>,
    V: AddressVerifier,
{
    async fn ping(&self, cancel: &CancellationToken, record: AddressRecord) -> Result<(), CoreError> {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let from = record.address().clone();
        let nonce = record.nonce();
        let outcome = self.accept(record).inspect_err(|err| {
            info!(%from, nonce, %err, "rejected ping");
        })?;
        debug!(%from, nonce, %outcome, "accepted ping");

        if self.config.reciprocate_pings {
            self.reciprocate(cancel, &from).await;
        }
        Ok(())
    }

    async fn pong(&self, cancel: &CancellationToken, record: AddressRecord) -> Result<(), CoreError> {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let from = record.address().clone();
        let nonce = record.nonce();
        let outcome = self.accept(record).inspect_err(|err| {
            info!(%from, nonce, %err, "rejected pong");
        })?;
        debug!(%from, nonce, %outcome, "accepted pong");
        Ok(())
    }

    async fn query(
        &self,
        cancel: &CancellationToken,
        target: &Identifier,
    ) -> Result<Vec<AddressRecord>, CoreError> {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let mut records = self.store.all()?;
        sort_by_distance(target, &mut records);
        records.truncate(self.config.max_query_results);

        debug!(%target, results = records.len(), "answered query");
        Ok(records)
    }
}
