//! Utility functions for address records.

use bytes::{Bytes, BytesMut};
use libp2p::Multiaddr;
use proptest::prelude::*;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::{Identifier, MultiAddress};

/// Generate the message to sign for an address advertisement.
///
/// Format: `"meridian-address-" || canonical_address || nonce(BE)`
pub(crate) fn generate_sign_message(address: &MultiAddress, nonce: u64) -> Bytes {
    let canonical = address.to_string();
    let mut message = BytesMut::with_capacity(17 + canonical.len() + 8);
    message.extend_from_slice(b"meridian-address-");
    message.extend_from_slice(canonical.as_bytes());
    message.extend_from_slice(nonce.to_be_bytes().as_slice());
    message.freeze()
}

/// Strategy producing valid ip4/ip6 tcp multiaddrs for property testing.
pub fn arbitrary_multiaddr() -> impl Strategy<Value = Multiaddr> {
    let ip4 = (any::<[u8; 4]>(), 1025u16..=65535)
        .prop_map(|(ip, port)| format!("/ip4/{}/tcp/{}", Ipv4Addr::from(ip), port));
    let ip6 = (any::<[u8; 16]>(), 1025u16..=65535)
        .prop_map(|(ip, port)| format!("/ip6/{}/tcp/{}", Ipv6Addr::from(ip), port));

    prop_oneof![ip4, ip6].prop_filter_map("unparseable multiaddr", |addr| addr.parse::<Multiaddr>().ok())
}

/// Strategy producing non-empty identifiers of up to 32 bytes.
pub fn arbitrary_identifier() -> impl Strategy<Value = Identifier> {
    proptest::collection::vec(any::<u8>(), 1..=32)
        .prop_filter_map("empty identifier", |bytes| Identifier::new(bytes).ok())
}

/// Strategy producing complete multiaddresses.
pub fn arbitrary_address() -> impl Strategy<Value = MultiAddress> {
    (arbitrary_multiaddr(), arbitrary_identifier())
        .prop_map(|(transport, identifier)| MultiAddress::new(transport, identifier))
}
