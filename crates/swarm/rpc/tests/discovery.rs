//! End-to-end discovery exchanges between nodes on a loopback network.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use bytes::Bytes;
use meridian_net_backoff::{Backoff, BackoffConfig};
use meridian_net_peer_store::{AddressStore, MemoryAddressStore};
use meridian_net_ratelimiter::RateLimiterConfig;
use meridian_swarm_api::{
    CancellationToken, CoreError, ErrorKind, SwarmClient, SwarmCore, SwarmError,
};
use meridian_swarm_peer::{
    AddressRecord, AddressSigner, EcdsaSigner, EcdsaVerifier, Identifier, MultiAddress,
};
use meridian_swarm_rpc::proto::{
    self, PingRequest, PingResponse, PongRequest, PongResponse, QueryRequest, QueryResponse,
};
use meridian_swarm_rpc::{
    LoopbackDialer, LoopbackNetwork, RequestContext, SwarmHandler, SwarmRpcClient, SwarmService,
};
use meridian_swarm_topology::{KademliaCore, TopologyConfig};

type Store = Arc<MemoryAddressStore<AddressRecord>>;
type Client = SwarmRpcClient<LoopbackDialer, Store>;
type Core = KademliaCore<Store, EcdsaVerifier>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

struct TestNode {
    signer: EcdsaSigner,
    address: MultiAddress,
    store: Store,
    client: Arc<Client>,
}

impl TestNode {
    fn identifier(&self) -> Identifier {
        self.signer.identifier()
    }

    fn record(&self, nonce: u64) -> AddressRecord {
        AddressRecord::signed(self.address.clone(), nonce, &self.signer).unwrap()
    }

    fn stored_nonce(&self, id: &Identifier) -> Option<u64> {
        self.store.get(id).unwrap().map(|record| record.nonce())
    }
}

struct NodeBuilder {
    port: u16,
    rate_limit: RateLimiterConfig,
    reciprocate: bool,
    publish_self: bool,
}

impl NodeBuilder {
    fn new(port: u16) -> Self {
        Self {
            port,
            rate_limit: RateLimiterConfig::default(),
            reciprocate: true,
            publish_self: true,
        }
    }

    fn rate_limit(mut self, min_interval: Duration) -> Self {
        self.rate_limit = RateLimiterConfig::with_min_interval(min_interval);
        self
    }

    fn reciprocate(mut self, reciprocate: bool) -> Self {
        self.reciprocate = reciprocate;
        self
    }

    fn without_self_record(mut self) -> Self {
        self.publish_self = false;
        self
    }

    fn spawn(self, network: &LoopbackNetwork) -> TestNode {
        let signer = EcdsaSigner::random();
        let address = MultiAddress::new(
            format!("/ip4/127.0.0.1/tcp/{}", self.port).parse().unwrap(),
            signer.identifier(),
        );
        let store: Store = Arc::new(MemoryAddressStore::new());
        if self.publish_self {
            store
                .insert(AddressRecord::signed(address.clone(), 1, &signer).unwrap())
                .unwrap();
        }

        let client = Arc::new(SwarmRpcClient::new(
            signer.identifier(),
            store.clone(),
            network.dialer(address.to_string()),
            Backoff::new(BackoffConfig::default().with_max_attempts(3)),
        ));
        let core: Arc<Core> = Arc::new(
            KademliaCore::new(
                signer.identifier(),
                store.clone(),
                EcdsaVerifier,
                TopologyConfig::default().with_reciprocate_pings(self.reciprocate),
            )
            .with_responder(client.clone()),
        );
        let service = Arc::new(SwarmService::new(core).with_rate_limit(self.rate_limit));
        network.register(address.clone(), service);

        TestNode {
            signer,
            address,
            store,
            client,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_stale_nonce_rejected_end_to_end() {
    init_tracing();
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).reciprocate(false).spawn(&network);
    let b = NodeBuilder::new(1001).reciprocate(false).spawn(&network);
    let cancel = CancellationToken::new();

    a.client.ping(&cancel, &b.address, &a.record(5)).await.unwrap();
    assert_eq!(b.stored_nonce(&a.identifier()), Some(5));

    let requests = network.requests();
    let err = a
        .client
        .ping(&cancel, &b.address, &a.record(4))
        .await
        .unwrap_err();
    assert_matches!(err, SwarmError::Rejected(ref msg) if msg.contains("stale nonce"));
    assert_eq!(err.kind(), ErrorKind::CoreRejection);

    // deliberate rejections are not retried
    assert_eq!(network.requests(), requests + 1);
    assert_eq!(b.stored_nonce(&a.identifier()), Some(5));
    assert_eq!(network.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ping_reciprocated_with_pong() {
    init_tracing();
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let b = NodeBuilder::new(1001).spawn(&network);

    a.client
        .ping(&CancellationToken::new(), &b.address, &a.record(2))
        .await
        .unwrap();

    assert_eq!(b.stored_nonce(&a.identifier()), Some(2));
    assert_eq!(a.stored_nonce(&b.identifier()), Some(1));
    assert_eq!(network.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_query_returns_closest_first() {
    init_tracing();
    let network = LoopbackNetwork::new();
    let hub = NodeBuilder::new(1000).reciprocate(false).spawn(&network);
    let peers: Vec<TestNode> = (1..=4)
        .map(|i| NodeBuilder::new(1000 + i).reciprocate(false).spawn(&network))
        .collect();
    let cancel = CancellationToken::new();

    for peer in &peers {
        peer.client
            .ping(&cancel, &hub.address, &peer.record(3))
            .await
            .unwrap();
    }

    let target = &peers[3];
    let results = peers[0]
        .client
        .query(&cancel, &hub.address, &target.identifier())
        .await
        .unwrap();

    // every peer plus the hub's own record
    assert_eq!(results.len(), 5);
    assert_eq!(results[0].identifier(), &target.identifier());
    assert_eq!(results[0].nonce(), 3);
    assert_eq!(network.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_query_unknown_target_on_empty_core() {
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let empty = NodeBuilder::new(1001).without_self_record().spawn(&network);

    let results = a
        .client
        .query(
            &CancellationToken::new(),
            &empty.address,
            &Identifier::parse("deadbeef").unwrap(),
        )
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_invalid_input_fails_before_dialing() {
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let b = NodeBuilder::new(1001).spawn(&network);
    let cancel = CancellationToken::new();

    let err = a
        .client
        .query(&cancel, &b.address, &Identifier::default())
        .await
        .unwrap_err();
    assert_matches!(err, SwarmError::InvalidIdentifier);
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = a
        .client
        .ping(&cancel, &b.address, &AddressRecord::default())
        .await
        .unwrap_err();
    assert_matches!(err, SwarmError::InvalidAddress(_));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    assert_eq!(network.dials(), 0);
}

/// Answers queries with one well-formed and one malformed entry.
struct MalformedHandler {
    good: AddressRecord,
}

#[async_trait]
impl SwarmHandler for MalformedHandler {
    async fn ping(&self, _ctx: &RequestContext, _request: PingRequest) -> Result<PingResponse, SwarmError> {
        Ok(PingResponse {})
    }

    async fn pong(&self, _ctx: &RequestContext, _request: PongRequest) -> Result<PongResponse, SwarmError> {
        Ok(PongResponse {})
    }

    async fn query(&self, _ctx: &RequestContext, _request: QueryRequest) -> Result<QueryResponse, SwarmError> {
        Ok(QueryResponse {
            multi_addresses: vec![
                proto::MultiAddress::from(&self.good),
                proto::MultiAddress {
                    multi_address: "/ip4/10.0.0.9/tcp/1/meridian/not-hex".into(),
                    signature: Bytes::from_static(b"sig"),
                    multi_address_nonce: 9,
                },
            ],
        })
    }
}

#[tokio::test]
async fn test_malformed_query_entry_dropped() {
    init_tracing();
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let b = NodeBuilder::new(1001).spawn(&network);

    let remote: MultiAddress = "/ip4/10.0.0.9/tcp/1/meridian/99".parse().unwrap();
    network.register(
        remote.clone(),
        Arc::new(MalformedHandler {
            good: b.record(7),
        }),
    );

    let results = a
        .client
        .query(&CancellationToken::new(), &remote, &b.identifier())
        .await
        .unwrap();
    assert_eq!(results, vec![b.record(7)]);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_caller() {
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let b = NodeBuilder::new(1001)
        .reciprocate(false)
        .rate_limit(Duration::from_secs(60))
        .spawn(&network);
    let cancel = CancellationToken::new();

    a.client.ping(&cancel, &b.address, &a.record(2)).await.unwrap();
    let err = a
        .client
        .ping(&cancel, &b.address, &a.record(3))
        .await
        .unwrap_err();
    assert_matches!(err, SwarmError::RateLimitExceeded);
    assert_eq!(b.stored_nonce(&a.identifier()), Some(2));
    assert_eq!(network.requests(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_retried() {
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let b = NodeBuilder::new(1001).reciprocate(false).spawn(&network);

    network.inject_failures(&b.address, 2);
    a.client
        .ping(&CancellationToken::new(), &b.address, &a.record(2))
        .await
        .unwrap();

    assert_eq!(b.stored_nonce(&a.identifier()), Some(2));
    assert_eq!(network.dials(), 1);
    assert_eq!(network.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_persistent_failure_exhausts_attempts() {
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let b = NodeBuilder::new(1001).spawn(&network);

    network.inject_failures(&b.address, 10);
    let err = a
        .client
        .ping(&CancellationToken::new(), &b.address, &a.record(2))
        .await
        .unwrap_err();

    assert_matches!(err, SwarmError::Transport(_));
    assert_eq!(network.requests(), 0);
    assert_eq!(network.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_peer_is_dial_error() {
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let b = NodeBuilder::new(1001).spawn(&network);

    network.set_offline(&b.address, true);
    let err = a.client.pong(&CancellationToken::new(), &b.address).await.unwrap_err();

    assert_matches!(err, SwarmError::Dial(_));
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert_eq!(network.dials(), 3);
    assert_eq!(network.open_connections(), 0);

    network.set_offline(&b.address, false);
    a.client.pong(&CancellationToken::new(), &b.address).await.unwrap();
    assert_eq!(b.stored_nonce(&a.identifier()), Some(1));
}

#[tokio::test]
async fn test_cancelled_call() {
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let b = NodeBuilder::new(1001).spawn(&network);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = a
        .client
        .query(&cancel, &b.address, &b.identifier())
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(network.requests(), 0);
    assert_eq!(network.open_connections(), 0);
}

#[tokio::test]
async fn test_missing_self_record() {
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).without_self_record().spawn(&network);
    let b = NodeBuilder::new(1001).spawn(&network);

    assert_eq!(a.client.self_address(), AddressRecord::default());
    assert_eq!(b.client.self_address(), b.record(1));

    let err = a.client.pong(&CancellationToken::new(), &b.address).await.unwrap_err();
    assert_matches!(err, SwarmError::StoreLookup(_));
    assert_eq!(network.dials(), 0);
}

#[tokio::test]
async fn test_self_advertisement_rejected() {
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);

    let err = a
        .client
        .ping(&CancellationToken::new(), &a.address, &a.record(9))
        .await
        .unwrap_err();
    assert_matches!(err, SwarmError::Rejected(_));
    assert_eq!(a.stored_nonce(&a.identifier()), Some(1));
}

/// A core whose store is always failing.
#[derive(Default)]
struct BrokenStoreCore {
    calls: AtomicUsize,
}

impl BrokenStoreCore {
    fn fail(&self) -> CoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CoreError::Store("backend offline".into())
    }
}

#[async_trait]
impl SwarmCore for BrokenStoreCore {
    async fn ping(&self, _cancel: &CancellationToken, _record: AddressRecord) -> Result<(), CoreError> {
        Err(self.fail())
    }

    async fn pong(&self, _cancel: &CancellationToken, _record: AddressRecord) -> Result<(), CoreError> {
        Err(self.fail())
    }

    async fn query(
        &self,
        _cancel: &CancellationToken,
        _target: &Identifier,
    ) -> Result<Vec<AddressRecord>, CoreError> {
        Err(self.fail())
    }
}

#[tokio::test(start_paused = true)]
async fn test_remote_store_failure_not_retried() {
    init_tracing();
    let network = LoopbackNetwork::new();
    let a = NodeBuilder::new(1000).spawn(&network);
    let signer = EcdsaSigner::random();
    let broken: MultiAddress = MultiAddress::new(
        "/ip4/127.0.0.1/tcp/1001".parse().unwrap(),
        signer.identifier(),
    );
    let core = Arc::new(BrokenStoreCore::default());
    network.register(broken.clone(), Arc::new(SwarmService::new(core.clone())));
    let cancel = CancellationToken::new();

    let err = a
        .client
        .query(&cancel, &broken, &a.identifier())
        .await
        .unwrap_err();
    assert_matches!(err, SwarmError::Rejected(ref msg) if msg == "cannot query closest peers");
    assert_eq!(err.kind(), ErrorKind::CoreRejection);
    assert_eq!(network.requests(), 1);
    assert_eq!(core.calls.load(Ordering::SeqCst), 1);

    let err = a
        .client
        .ping(&cancel, &broken, &a.record(2))
        .await
        .unwrap_err();
    assert_matches!(err, SwarmError::Rejected(ref msg) if msg == "cannot update store");
    assert_eq!(network.requests(), 2);
    assert_eq!(core.calls.load(Ordering::SeqCst), 2);
    assert_eq!(network.open_connections(), 0);
}
