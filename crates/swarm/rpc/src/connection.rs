use async_trait::async_trait;
use tonic::Status;

use crate::proto::{PingRequest, PingResponse, PongRequest, PongResponse, QueryRequest, QueryResponse};

/// Request stub exposed by a dialed connection to a remote swarm service.
///
/// Connections are released by dropping them.
#[async_trait]
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait SwarmConnection: Send + Sync {
    async fn ping(&self, request: PingRequest) -> Result<PingResponse, Status>;

    async fn pong(&self, request: PongRequest) -> Result<PongResponse, Status>;

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, Status>;
}
