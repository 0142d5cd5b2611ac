//! Peer identity and addressing primitives for the Meridian swarm.
//!
//! - [`Identifier`] - opaque, byte-comparable peer identity
//! - [`MultiAddress`] - transport location plus identifier, canonical string form
//! - [`AddressRecord`] - signed, nonce-versioned address advertisement
//! - [`AddressSigner`] / [`AddressVerifier`] - signing seam, with an ECDSA implementation

mod address;
mod error;
mod identifier;
mod record;
mod signer;
mod util;

pub use address::{MultiAddress, PROTOCOL_TAG};
pub use error::{AddressParseError, IdentifierError, RecordError, SignerError, VerifyError};
pub use identifier::Identifier;
pub use record::{AddressRecord, Signature};
pub use signer::{AcceptAnyVerifier, AddressSigner, AddressVerifier, EcdsaSigner, EcdsaVerifier};
pub use libp2p::Multiaddr;
pub use util::{arbitrary_address, arbitrary_identifier, arbitrary_multiaddr};
