//! Inbound side of the swarm discovery protocol.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use meridian_net_ratelimiter::{RateLimiter, RateLimiterConfig};
use meridian_swarm_api::{CancellationToken, CoreError, SwarmCore, SwarmError};
use meridian_swarm_peer::{AddressRecord, Identifier};
use tonic::Status;
use tracing::{debug, info};

use crate::proto::{
    self, PingRequest, PingResponse, PongRequest, PongResponse, QueryRequest, QueryResponse,
};
use crate::{IntoStatus, SwarmConnection};

/// Per-request metadata supplied by the transport.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Identity of the caller, used as the rate-limit key.
    pub remote: String,
    /// Cancelled when the caller goes away.
    pub cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Handles decoded swarm requests.
///
/// Implemented by [`SwarmService`]; transports hold handlers as trait objects.
#[async_trait]
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait SwarmHandler: Send + Sync {
    async fn ping(&self, ctx: &RequestContext, request: PingRequest)
    -> Result<PingResponse, SwarmError>;

    async fn pong(&self, ctx: &RequestContext, request: PongRequest)
    -> Result<PongResponse, SwarmError>;

    async fn query(
        &self,
        ctx: &RequestContext,
        request: QueryRequest,
    ) -> Result<QueryResponse, SwarmError>;
}

/// Swarm service: validates requests and delegates to a [`SwarmCore`].
///
/// Core failures are per-request outcomes; the service keeps serving.
pub struct SwarmService<C> {
    core: C,
    limiter: Option<RateLimiter<String>>,
}

impl<C: SwarmCore> SwarmService<C> {
    pub fn new(core: C) -> Self {
        Self {
            core,
            limiter: None,
        }
    }

    /// Reject callers that send requests faster than `config` allows.
    pub fn with_rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.limiter = config.is_enabled().then(|| RateLimiter::new(config));
        self
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn rate_limiter(&self) -> Option<&RateLimiter<String>> {
        self.limiter.as_ref()
    }

    fn check_rate(&self, ctx: &RequestContext) -> Result<(), SwarmError> {
        let Some(limiter) = self.limiter.as_ref() else {
            return Ok(());
        };
        limiter.check(&ctx.remote).map_err(|limited| {
            debug!(remote = %ctx.remote, retry_after = ?limited.retry_after, "rate limited");
            SwarmError::RateLimitExceeded
        })
    }

    async fn run<T>(
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CoreError::Cancelled),
            result = call => result,
        }
    }
}

fn decode_advertisement(
    wire: Option<proto::MultiAddress>,
    request: &'static str,
) -> Result<AddressRecord, SwarmError> {
    let wire = wire.ok_or(SwarmError::NilRequest(request))?;
    Ok(AddressRecord::try_from(wire)?)
}

fn registration_failure(remote: &str, err: CoreError) -> SwarmError {
    match err {
        CoreError::Cancelled => {
            debug!(remote, "registration cancelled");
            SwarmError::Cancelled
        }
        err => {
            info!(remote, %err, "cannot update store");
            SwarmError::Registration(err)
        }
    }
}

fn lookup_failure(remote: &str, err: CoreError) -> SwarmError {
    match err {
        CoreError::Cancelled => {
            debug!(remote, "lookup cancelled");
            SwarmError::Cancelled
        }
        err => {
            info!(remote, %err, "cannot query closest peers");
            SwarmError::Lookup(err)
        }
    }
}

#[async_trait]
impl<C: SwarmCore> SwarmHandler for SwarmService<C> {
    async fn ping(
        &self,
        ctx: &RequestContext,
        request: PingRequest,
    ) -> Result<PingResponse, SwarmError> {
        self.check_rate(ctx)?;
        let record = decode_advertisement(request.multi_address, "ping")?;
        debug!(remote = %ctx.remote, address = %record.address(), nonce = record.nonce(), "ping received");

        Self::run(&ctx.cancel, self.core.ping(&ctx.cancel, record))
            .await
            .map_err(|err| registration_failure(&ctx.remote, err))?;
        Ok(PingResponse {})
    }

    async fn pong(
        &self,
        ctx: &RequestContext,
        request: PongRequest,
    ) -> Result<PongResponse, SwarmError> {
        self.check_rate(ctx)?;
        let record = decode_advertisement(request.multi_address, "pong")?;
        debug!(remote = %ctx.remote, address = %record.address(), nonce = record.nonce(), "pong received");

        Self::run(&ctx.cancel, self.core.pong(&ctx.cancel, record))
            .await
            .map_err(|err| registration_failure(&ctx.remote, err))?;
        Ok(PongResponse {})
    }

    async fn query(
        &self,
        ctx: &RequestContext,
        request: QueryRequest,
    ) -> Result<QueryResponse, SwarmError> {
        self.check_rate(ctx)?;
        if request.address.is_empty() {
            return Err(SwarmError::InvalidIdentifier);
        }
        let target = Identifier::parse(&request.address)?;
        debug!(remote = %ctx.remote, %target, "query received");

        let records = Self::run(&ctx.cancel, self.core.query(&ctx.cancel, &target))
            .await
            .map_err(|err| lookup_failure(&ctx.remote, err))?;
        Ok(records.into_iter().collect())
    }
}

/// A handler bound to one caller, usable as a [`SwarmConnection`].
///
/// Errors are converted to [`Status`] the way a remote caller would see them.
pub struct ServiceEndpoint<H> {
    handler: Arc<H>,
    remote: String,
    cancel: CancellationToken,
}

impl<H: SwarmHandler> ServiceEndpoint<H> {
    pub fn new(handler: Arc<H>, remote: impl Into<String>) -> Self {
        Self {
            handler,
            remote: remote.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel in-flight requests when `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn context(&self) -> RequestContext {
        RequestContext::new(self.remote.clone()).with_cancel(self.cancel.child_token())
    }
}

#[async_trait]
impl<H: SwarmHandler> SwarmConnection for ServiceEndpoint<H> {
    async fn ping(&self, request: PingRequest) -> Result<PingResponse, Status> {
        self.handler
            .ping(&self.context(), request)
            .await
            .map_err(IntoStatus::into_status)
    }

    async fn pong(&self, request: PongRequest) -> Result<PongResponse, Status> {
        self.handler
            .pong(&self.context(), request)
            .await
            .map_err(IntoStatus::into_status)
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, Status> {
        self.handler
            .query(&self.context(), request)
            .await
            .map_err(IntoStatus::into_status)
    }
}
