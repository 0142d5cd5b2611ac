//! In-process transport.
//!
//! Every request and response is encoded and decoded with prost, so the
//! loopback exercises the same wire schema as a real transport. The network
//! counts open connections and can simulate transient failures and offline
//! endpoints.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use meridian_net_dialer::{DialError, Dialer};
use meridian_swarm_peer::MultiAddress;
use prost::Message;
use tonic::Status;
use tracing::{debug, trace};

use crate::proto::{PingRequest, PingResponse, PongRequest, PongResponse, QueryRequest, QueryResponse};
use crate::{IntoStatus, RequestContext, SwarmConnection, SwarmHandler};

#[derive(Default)]
struct Inner {
    endpoints: DashMap<MultiAddress, Arc<dyn SwarmHandler>>,
    offline: DashSet<MultiAddress>,
    /// Remaining injected failures per destination.
    failures: DashMap<MultiAddress, u32>,
    open: AtomicUsize,
    dials: AtomicUsize,
    requests: AtomicUsize,
}

/// Shared registry of in-process swarm endpoints.
#[derive(Clone, Default)]
pub struct LoopbackNetwork {
    inner: Arc<Inner>,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `handler` at `address`, replacing any previous endpoint.
    pub fn register(&self, address: MultiAddress, handler: Arc<dyn SwarmHandler>) {
        debug!(%address, "loopback endpoint registered");
        self.inner.endpoints.insert(address, handler);
    }

    pub fn unregister(&self, address: &MultiAddress) {
        self.inner.endpoints.remove(address);
    }

    /// Make `address` refuse dials and fail requests on open connections.
    pub fn set_offline(&self, address: &MultiAddress, offline: bool) {
        if offline {
            self.inner.offline.insert(address.clone());
        } else {
            self.inner.offline.remove(address);
        }
    }

    /// Fail the next `count` requests to `address` with `Unavailable`.
    pub fn inject_failures(&self, address: &MultiAddress, count: u32) {
        self.inner.failures.insert(address.clone(), count);
    }

    /// A dialer presenting itself to remote endpoints as `local`.
    pub fn dialer(&self, local: impl Into<String>) -> LoopbackDialer {
        LoopbackDialer {
            inner: self.inner.clone(),
            local: local.into(),
        }
    }

    /// Connections currently held by callers.
    pub fn open_connections(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Dial attempts, successful or not.
    pub fn dials(&self) -> usize {
        self.inner.dials.load(Ordering::SeqCst)
    }

    /// Requests delivered to a handler.
    pub fn requests(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }
}

/// Dials endpoints registered on a [`LoopbackNetwork`].
#[derive(Clone)]
pub struct LoopbackDialer {
    inner: Arc<Inner>,
    local: String,
}

#[async_trait]
impl Dialer<MultiAddress> for LoopbackDialer {
    type Connection = LoopbackConnection;

    async fn dial(&self, destination: &MultiAddress) -> Result<LoopbackConnection, DialError> {
        self.inner.dials.fetch_add(1, Ordering::SeqCst);

        if self.inner.offline.contains(destination) {
            return Err(DialError::unreachable(destination, "endpoint offline"));
        }
        let handler = self
            .inner
            .endpoints
            .get(destination)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DialError::unreachable(destination, "no endpoint registered"))?;

        self.inner.open.fetch_add(1, Ordering::SeqCst);
        trace!(%destination, caller = %self.local, "loopback connection opened");
        Ok(LoopbackConnection {
            inner: self.inner.clone(),
            destination: destination.clone(),
            caller: self.local.clone(),
            handler,
        })
    }
}

/// An open loopback connection; dropping it releases the connection.
pub struct LoopbackConnection {
    inner: Arc<Inner>,
    destination: MultiAddress,
    caller: String,
    handler: Arc<dyn SwarmHandler>,
}

impl LoopbackConnection {
    fn begin(&self) -> Result<RequestContext, Status> {
        if self.inner.offline.contains(&self.destination) {
            return Err(Status::unavailable("endpoint offline"));
        }
        if let Some(mut remaining) = self.inner.failures.get_mut(&self.destination)
            && *remaining > 0
        {
            *remaining -= 1;
            debug!(destination = %self.destination, "injected failure");
            return Err(Status::unavailable("injected failure"));
        }
        self.inner.requests.fetch_add(1, Ordering::SeqCst);
        Ok(RequestContext::new(self.caller.clone()))
    }
}

impl Drop for LoopbackConnection {
    fn drop(&mut self) {
        self.inner.open.fetch_sub(1, Ordering::SeqCst);
        trace!(destination = %self.destination, "loopback connection closed");
    }
}

/// Pass a message through its wire encoding.
fn transcode<M: Message + Default>(message: &M) -> Result<M, Status> {
    let frame = message.encode_to_vec();
    trace!(len = frame.len(), "loopback frame");
    M::decode(frame.as_slice()).map_err(|err| Status::data_loss(format!("malformed frame: {err}")))
}

#[async_trait]
impl SwarmConnection for LoopbackConnection {
    async fn ping(&self, request: PingRequest) -> Result<PingResponse, Status> {
        let ctx = self.begin()?;
        let response = self
            .handler
            .ping(&ctx, transcode(&request)?)
            .await
            .map_err(IntoStatus::into_status)?;
        transcode(&response)
    }

    async fn pong(&self, request: PongRequest) -> Result<PongResponse, Status> {
        let ctx = self.begin()?;
        let response = self
            .handler
            .pong(&ctx, transcode(&request)?)
            .await
            .map_err(IntoStatus::into_status)?;
        transcode(&response)
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, Status> {
        let ctx = self.begin()?;
        let response = self
            .handler
            .query(&ctx, transcode(&request)?)
            .await
            .map_err(IntoStatus::into_status)?;
        transcode(&response)
    }
}
