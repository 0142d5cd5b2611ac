//! Wire messages for the swarm discovery protocol.
//!
//! Field tags are part of the protocol and must not change.

use bytes::Bytes;
use meridian_swarm_peer::{AddressParseError, AddressRecord, Signature};

/// A signed address as carried on the wire.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MultiAddress {
    /// Canonical address string.
    #[prost(string, tag = "1")]
    pub multi_address: String,
    #[prost(bytes = "bytes", tag = "2")]
    pub signature: Bytes,
    #[prost(uint64, tag = "3")]
    pub multi_address_nonce: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PingRequest {
    #[prost(message, optional, tag = "1")]
    pub multi_address: Option<MultiAddress>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct PingResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PongRequest {
    #[prost(message, optional, tag = "1")]
    pub multi_address: Option<MultiAddress>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct PongResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryRequest {
    /// Hex identifier of the query target.
    #[prost(string, tag = "1")]
    pub address: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryResponse {
    #[prost(message, repeated, tag = "1")]
    pub multi_addresses: Vec<MultiAddress>,
}

impl From<&AddressRecord> for MultiAddress {
    fn from(record: &AddressRecord) -> Self {
        Self {
            multi_address: record.address().to_string(),
            signature: record.signature().clone().into_bytes(),
            multi_address_nonce: record.nonce(),
        }
    }
}

impl From<AddressRecord> for MultiAddress {
    fn from(record: AddressRecord) -> Self {
        Self::from(&record)
    }
}

impl TryFrom<MultiAddress> for AddressRecord {
    type Error = AddressParseError;

    fn try_from(wire: MultiAddress) -> Result<Self, Self::Error> {
        let address = wire.multi_address.parse()?;
        Ok(AddressRecord::new(
            address,
            Signature::from(wire.signature),
            wire.multi_address_nonce,
        ))
    }
}

impl PingRequest {
    pub fn new(record: &AddressRecord) -> Self {
        Self {
            multi_address: Some(record.into()),
        }
    }
}

impl PongRequest {
    pub fn new(record: &AddressRecord) -> Self {
        Self {
            multi_address: Some(record.into()),
        }
    }
}

impl FromIterator<AddressRecord> for QueryResponse {
    fn from_iter<I: IntoIterator<Item = AddressRecord>>(records: I) -> Self {
        Self {
            multi_addresses: records.into_iter().map(MultiAddress::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use meridian_swarm_peer::{AddressSigner, EcdsaSigner};
    use prost::Message;

    use super::*;

    #[test]
    fn test_record_survives_wire() {
        let signer = EcdsaSigner::random();
        let address = meridian_swarm_peer::MultiAddress::new(
            "/ip4/10.0.0.1/tcp/18514".parse().unwrap(),
            signer.identifier(),
        );
        let record = AddressRecord::signed(address, 42, &signer).unwrap();

        let bytes = PingRequest::new(&record).encode_to_vec();
        let decoded = PingRequest::decode(bytes.as_slice()).unwrap();
        let restored = AddressRecord::try_from(decoded.multi_address.unwrap()).unwrap();

        assert_eq!(restored, record);
        assert_eq!(restored.signature().as_bytes(), record.signature().as_bytes());
        assert_eq!(restored.nonce(), 42);
    }

    #[test]
    fn test_missing_address_decodes_as_none() {
        let decoded = PongRequest::decode(&[][..]).unwrap();
        assert!(decoded.multi_address.is_none());
    }

    #[test]
    fn test_malformed_address_rejected() {
        let wire = MultiAddress {
            multi_address: "not an address".into(),
            signature: Bytes::new(),
            multi_address_nonce: 1,
        };
        assert!(AddressRecord::try_from(wire).is_err());
    }
}
