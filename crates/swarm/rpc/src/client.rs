//! Outbound side of the swarm discovery protocol.

use async_trait::async_trait;
use meridian_net_backoff::{Backoff, BackoffError};
use meridian_net_dialer::Dialer;
use meridian_net_peer_store::AddressStore;
use meridian_swarm_api::{CancellationToken, SwarmClient, SwarmError};
use meridian_swarm_peer::{AddressRecord, Identifier, MultiAddress};
use tracing::{debug, info, warn};

use crate::proto::{PingRequest, PongRequest, QueryRequest};
use crate::{FromStatus, SwarmConnection, parse_records};

/// Swarm client dialing peers through `D` and reading the local record from `S`.
///
/// Each call opens its own connection. Both the dial and the request are
/// retried under the backoff policy; the connection is dropped on every exit
/// path.
pub struct SwarmRpcClient<D, S> {
    local: Identifier,
    store: S,
    dialer: D,
    backoff: Backoff,
}

impl<D, S> SwarmRpcClient<D, S>
where
    D: Dialer<MultiAddress>,
    D::Connection: SwarmConnection,
    S: AddressStore<AddressRecord>,
{
    pub fn new(local: Identifier, store: S, dialer: D, backoff: Backoff) -> Self {
        Self {
            local,
            store,
            dialer,
            backoff,
        }
    }

    pub fn local(&self) -> &Identifier {
        &self.local
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    async fn connect(
        &self,
        cancel: &CancellationToken,
        to: &MultiAddress,
    ) -> Result<D::Connection, SwarmError> {
        self.backoff
            .retry(cancel, move || async move {
                self.dialer.dial(to).await.map_err(SwarmError::from)
            })
            .await
            .map_err(|err| settle(err, "dial", to))
    }

    fn local_record(&self) -> Result<AddressRecord, SwarmError> {
        match self.store.get(&self.local) {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(SwarmError::StoreLookup(format!(
                "no record for local identifier {}",
                self.local
            ))),
            Err(err) => Err(SwarmError::StoreLookup(err.to_string())),
        }
    }
}

/// Collapse a backoff outcome into the error reported to the caller.
fn settle(err: BackoffError<SwarmError>, op: &'static str, to: &MultiAddress) -> SwarmError {
    match err {
        BackoffError::Cancelled => {
            debug!(%to, op, "cancelled");
            SwarmError::Cancelled
        }
        BackoffError::Failed { attempts, source } => {
            if source.is_cancelled() {
                debug!(%to, op, "cancelled by remote");
            } else {
                info!(%to, op, attempts, err = %source, kind = %source.kind(), "request failed");
            }
            source
        }
    }
}

#[async_trait]
impl<D, S> SwarmClient for SwarmRpcClient<D, S>
where
    D: Dialer<MultiAddress>,
    D::Connection: SwarmConnection,
    S: AddressStore<AddressRecord>,
{
    async fn ping(
        &self,
        cancel: &CancellationToken,
        to: &MultiAddress,
        self_address: &AddressRecord,
    ) -> Result<(), SwarmError> {
        self_address.validate()?;
        let request = PingRequest::new(self_address);

        let connection = self.connect(cancel, to).await?;
        let connection = &connection;
        self.backoff
            .retry(cancel, move || {
                let request = request.clone();
                async move {
                    connection
                        .ping(request)
                        .await
                        .map_err(SwarmError::from_status)
                }
            })
            .await
            .map_err(|err| settle(err, "ping", to))?;

        debug!(%to, nonce = self_address.nonce(), "ping delivered");
        Ok(())
    }

    async fn pong(&self, cancel: &CancellationToken, to: &MultiAddress) -> Result<(), SwarmError> {
        let record = self.local_record().inspect_err(|err| {
            warn!(%to, %err, "cannot pong without a local record");
        })?;
        let request = PongRequest::new(&record);

        let connection = self.connect(cancel, to).await?;
        let connection = &connection;
        self.backoff
            .retry(cancel, move || {
                let request = request.clone();
                async move {
                    connection
                        .pong(request)
                        .await
                        .map_err(SwarmError::from_status)
                }
            })
            .await
            .map_err(|err| settle(err, "pong", to))?;

        debug!(%to, nonce = record.nonce(), "pong delivered");
        Ok(())
    }

    async fn query(
        &self,
        cancel: &CancellationToken,
        to: &MultiAddress,
        target: &Identifier,
    ) -> Result<Vec<AddressRecord>, SwarmError> {
        if target.is_empty() {
            return Err(SwarmError::InvalidIdentifier);
        }
        let request = QueryRequest {
            address: target.to_hex(),
        };

        let connection = self.connect(cancel, to).await?;
        let connection = &connection;
        let response = self
            .backoff
            .retry(cancel, move || {
                let request = request.clone();
                async move {
                    connection
                        .query(request)
                        .await
                        .map_err(SwarmError::from_status)
                }
            })
            .await
            .map_err(|err| settle(err, "query", to))?;

        let mut parsed = parse_records(response.multi_addresses);
        let records: Vec<AddressRecord> = parsed.by_ref().collect();
        for failure in parsed.failures() {
            warn!(
                %to,
                index = failure.index,
                address = %failure.address,
                err = %failure.error,
                "dropping malformed query result"
            );
        }

        debug!(%to, %target, results = records.len(), "query answered");
        Ok(records)
    }

    fn self_address(&self) -> AddressRecord {
        self.local_record()
            .inspect_err(|err| warn!(%err, "self address unavailable"))
            .unwrap_or_default()
    }
}
