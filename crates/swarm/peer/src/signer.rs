//! Signing and verification of address records.
//!
//! The protocol only needs a signature that binds an address to its
//! identifier at a given nonce. [`EcdsaSigner`] and [`EcdsaVerifier`] provide
//! that with secp256k1, where the identifier is the signer's 20-byte
//! Ethereum address.

use alloy_primitives::B256;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use auto_impl::auto_impl;
use bytes::Bytes;

use crate::{AddressRecord, Identifier, Signature, SignerError, VerifyError};

/// Produces signatures for the local node's address records.
#[auto_impl(&, Box, Arc)]
pub trait AddressSigner: Send + Sync {
    /// Identifier the produced signatures prove.
    fn identifier(&self) -> Identifier;

    fn sign(&self, message: &[u8]) -> Result<Signature, SignerError>;
}

/// Checks that a received record was signed by its identifier.
#[auto_impl(&, Box, Arc)]
pub trait AddressVerifier: Send + Sync {
    fn verify(&self, record: &AddressRecord) -> Result<(), VerifyError>;
}

/// secp256k1 signer over EIP-191 personal messages.
#[derive(Debug, Clone)]
pub struct EcdsaSigner {
    inner: PrivateKeySigner,
}

impl EcdsaSigner {
    pub fn random() -> Self {
        Self {
            inner: PrivateKeySigner::random(),
        }
    }

    /// Deterministic signer from a 32-byte secret key.
    pub fn from_secret(secret: [u8; 32]) -> Result<Self, SignerError> {
        let inner =
            PrivateKeySigner::from_bytes(&B256::from(secret)).map_err(|_| SignerError::InvalidKey)?;
        Ok(Self { inner })
    }

    pub fn from_signer(inner: PrivateKeySigner) -> Self {
        Self { inner }
    }
}

impl AddressSigner for EcdsaSigner {
    fn identifier(&self) -> Identifier {
        Identifier::from(self.inner.address())
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, SignerError> {
        let signature = self.inner.sign_message_sync(message)?;
        Ok(Signature::new(Bytes::copy_from_slice(&signature.as_bytes())))
    }
}

/// Verifies [`EcdsaSigner`] signatures by recovering the signer address.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdsaVerifier;

impl AddressVerifier for EcdsaVerifier {
    fn verify(&self, record: &AddressRecord) -> Result<(), VerifyError> {
        if record.signature().is_empty() {
            return Err(VerifyError::MissingSignature);
        }

        let signature = alloy_primitives::Signature::from_raw(record.signature().as_bytes())?;
        let recovered = Identifier::from(signature.recover_address_from_msg(record.signing_message())?);

        if &recovered != record.identifier() {
            return Err(VerifyError::Mismatch {
                expected: record.identifier().clone(),
                recovered,
            });
        }
        Ok(())
    }
}

/// Accepts every record, signed or not. For tests and trusted deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyVerifier;

impl AddressVerifier for AcceptAnyVerifier {
    fn verify(&self, _record: &AddressRecord) -> Result<(), VerifyError> {
        Ok(())
    }
}
