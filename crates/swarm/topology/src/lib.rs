//! Kademlia-style swarm core.
//!
//! [`KademliaCore`] accepts signed address records into an
//! [`AddressStore`](meridian_net_peer_store::AddressStore) and answers
//! closest-peer queries by XOR distance between identifiers.
//!
//! # Distance
//!
//! The distance between two identifiers is their byte-wise XOR, read as a
//! big-endian integer. Identifiers of different lengths are compared as if the
//! shorter one were padded with trailing zero bytes. Equal distances are
//! ordered by identifier bytes so that results are deterministic.

mod config;
mod distance;
mod kademlia;

pub use config::{DEFAULT_MAX_QUERY_RESULTS, DEFAULT_RECIPROCATE_TIMEOUT, TopologyConfig};
pub use distance::{distance, distance_cmp, sort_by_distance};
pub use kademlia::KademliaCore;
