//! Swarm discovery RPC for Meridian.
//!
//! This crate carries the ping, pong and query exchange between peers:
//!
//! - [`proto`] - wire messages and conversions to domain types
//! - [`SwarmService`] - inbound side, validating requests and delegating to a
//!   [`SwarmCore`](meridian_swarm_api::SwarmCore)
//! - [`SwarmRpcClient`] - outbound side, dialing peers under a backoff policy
//! - [`SwarmConnection`] - the request stub a dialed connection exposes
//! - [`LoopbackNetwork`] - in-process transport for simulation and tests
//!
//! Errors cross the wire as [`tonic::Status`]; see [`IntoStatus`] and
//! [`FromStatus`] for the mapping.

mod client;
mod connection;
mod loopback;
mod parse;
pub mod proto;
mod service;
mod status;

pub use client::SwarmRpcClient;
pub use connection::SwarmConnection;
pub use loopback::{LoopbackConnection, LoopbackDialer, LoopbackNetwork};
pub use parse::{MalformedEntry, ParseRecords, parse_records};
pub use service::{RequestContext, ServiceEndpoint, SwarmHandler, SwarmService};
pub use status::{FromStatus, IntoStatus};
