//! Error types for peer addressing and record signing.

use crate::Identifier;

/// Errors from [`Identifier`] construction and parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Errors from parsing the canonical [`MultiAddress`](crate::MultiAddress) string.
#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
    #[error("address is empty")]
    Empty,
    #[error("address has no /{}/ component", crate::PROTOCOL_TAG)]
    MissingIdentifier,
    #[error("address has no transport component")]
    MissingTransport,
    #[error("invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),
    #[error("invalid transport multiaddr: {0}")]
    Transport(#[from] libp2p::multiaddr::Error),
}

/// Errors from [`AddressRecord`](crate::AddressRecord) validation and construction.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("address record has an empty address")]
    EmptyAddress,
    #[error("address identifier {address} does not belong to signer {signer}")]
    IdentifierMismatch {
        address: Identifier,
        signer: Identifier,
    },
    #[error(transparent)]
    Signer(#[from] SignerError),
}

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("signing failed: {0}")]
    Signing(#[from] alloy_signer::Error),
    #[error("invalid secret key")]
    InvalidKey,
}

/// Errors from [`AddressVerifier::verify`](crate::AddressVerifier::verify).
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("address record is unsigned")]
    MissingSignature,
    #[error("malformed signature: {0}")]
    Malformed(#[from] alloy_primitives::SignatureError),
    #[error("signature recovers to {recovered}, expected {expected}")]
    Mismatch {
        expected: Identifier,
        recovered: Identifier,
    },
}
