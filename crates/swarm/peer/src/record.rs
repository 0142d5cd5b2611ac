use std::fmt;

use bytes::Bytes;
use meridian_net_peer_store::VersionedRecord;

use crate::util::generate_sign_message;
use crate::{AddressSigner, Identifier, MultiAddress, RecordError};

/// Opaque signature bytes over an address record's signing message.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature(Bytes);

impl Signature {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0))
    }
}

impl From<Bytes> for Signature {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

/// A peer's signed, versioned network address.
///
/// Construct via [`signed`](Self::signed) for the local node or
/// [`new`](Self::new) for data received from the network. A strictly higher
/// nonce for the same identifier supersedes a lower one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressRecord {
    address: MultiAddress,
    signature: Signature,
    nonce: u64,
}

impl AddressRecord {
    /// Assemble a record from received parts; no verification is performed.
    pub fn new(address: MultiAddress, signature: Signature, nonce: u64) -> Self {
        Self {
            address,
            signature,
            nonce,
        }
    }

    /// Sign `address` at `nonce` with the local signer.
    pub fn signed<S: AddressSigner + ?Sized>(
        address: MultiAddress,
        nonce: u64,
        signer: &S,
    ) -> Result<Self, RecordError> {
        if address.is_empty() {
            return Err(RecordError::EmptyAddress);
        }

        let signer_id = signer.identifier();
        if address.identifier() != &signer_id {
            return Err(RecordError::IdentifierMismatch {
                address: address.identifier().clone(),
                signer: signer_id,
            });
        }

        let signature = signer.sign(&generate_sign_message(&address, nonce))?;
        Ok(Self {
            address,
            signature,
            nonce,
        })
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.address.is_empty() {
            return Err(RecordError::EmptyAddress);
        }
        Ok(())
    }

    /// The bytes covered by the signature.
    pub fn signing_message(&self) -> Bytes {
        generate_sign_message(&self.address, self.nonce)
    }

    pub fn address(&self) -> &MultiAddress {
        &self.address
    }

    pub fn identifier(&self) -> &Identifier {
        self.address.identifier()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty()
    }

    /// True if this record would replace `other` in a store.
    pub fn supersedes(&self, other: &Self) -> bool {
        self.identifier() == other.identifier() && self.nonce > other.nonce
    }
}

impl VersionedRecord for AddressRecord {
    type Id = Identifier;

    fn record_id(&self) -> &Identifier {
        self.identifier()
    }

    fn version(&self) -> u64 {
        self.nonce
    }

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use meridian_net_peer_store::{AddressStore, InsertOutcome, MemoryAddressStore};

    use super::*;
    use crate::EcdsaSigner;

    fn address_for(signer: &EcdsaSigner) -> MultiAddress {
        MultiAddress::new(
            "/ip4/127.0.0.1/tcp/18514".parse().unwrap(),
            signer.identifier(),
        )
    }

    #[test]
    fn test_default_is_invalid() {
        let record = AddressRecord::default();
        assert!(record.is_empty());
        assert_matches!(record.validate(), Err(RecordError::EmptyAddress));
        assert!(!record.is_valid());
    }

    #[test]
    fn test_signing_message_layout() {
        let record = AddressRecord::new(
            "/ip4/10.0.0.1/tcp/1/meridian/01".parse().unwrap(),
            Signature::default(),
            5,
        );
        let message = record.signing_message();

        let mut expected = b"meridian-address-/ip4/10.0.0.1/tcp/1/meridian/01".to_vec();
        expected.extend_from_slice(&5u64.to_be_bytes());
        assert_eq!(message.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_signed_rejects_foreign_identifier() {
        let signer = EcdsaSigner::random();
        let foreign = MultiAddress::new(
            "/ip4/127.0.0.1/tcp/18514".parse().unwrap(),
            Identifier::parse("beef").unwrap(),
        );

        assert_matches!(
            AddressRecord::signed(foreign, 1, &signer),
            Err(RecordError::IdentifierMismatch { .. })
        );
        assert_matches!(
            AddressRecord::signed(MultiAddress::default(), 1, &signer),
            Err(RecordError::EmptyAddress)
        );
    }

    #[test]
    fn test_supersedes() {
        let signer = EcdsaSigner::random();
        let old = AddressRecord::signed(address_for(&signer), 4, &signer).unwrap();
        let new = AddressRecord::signed(address_for(&signer), 5, &signer).unwrap();

        assert!(new.supersedes(&old));
        assert!(!old.supersedes(&new));
        assert!(!new.supersedes(&new));
    }

    #[test]
    fn test_store_keeps_highest_nonce() {
        let signer = EcdsaSigner::random();
        let store = MemoryAddressStore::new();

        let five = AddressRecord::signed(address_for(&signer), 5, &signer).unwrap();
        let four = AddressRecord::signed(address_for(&signer), 4, &signer).unwrap();

        assert_eq!(store.insert(five.clone()).unwrap(), InsertOutcome::Inserted);
        assert_eq!(
            store.insert(four).unwrap(),
            InsertOutcome::Stale { current: 5 }
        );
        assert_eq!(store.get(&signer.identifier()).unwrap(), Some(five));
    }
}
