//! Swarm API - the contract between transport-facing code and the swarm core.
//!
//! This crate defines what peer discovery is, not how it is carried over the
//! wire or how peers are ranked. Wire codecs, transports and routing live in
//! `meridian-swarm-rpc` and `meridian-swarm-topology`.
//!
//! # Core Concepts
//!
//! - [`SwarmCore`] - Membership acceptance (ping/pong) and closest-peer lookup (query)
//! - [`SwarmClient`] - Outbound discovery calls to a remote peer
//! - [`SwarmError`] - Error taxonomy shared by client and service, classified by [`ErrorKind`]
//! - [`CoreError`] - Why the core refused a record or a lookup
//!
//! # Design Principles
//!
//! - Traits define *what*, implementations define *how*
//! - Every suspension point takes a [`CancellationToken`]
//! - Deliberate remote decisions are never retried; transport failures are

#![warn(missing_docs)]

mod client;
mod swarm;
mod error;

pub use client::SwarmClient;
pub use swarm::SwarmCore;
pub use error::{CoreError, ErrorKind, SwarmError};

pub use tokio_util::sync::CancellationToken;
