use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use bytes::Bytes;

use crate::IdentifierError;

/// Opaque, byte-comparable peer identity. Also used as a query target.
///
/// The canonical string form is lowercase hex without a prefix. The default
/// value is the empty identifier, which is never valid on the wire.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Bytes);

impl Identifier {
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self, IdentifierError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(IdentifierError::Empty);
        }
        Ok(Self(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentifierError> {
        Self::new(Bytes::copy_from_slice(bytes))
    }

    /// Parse a hex identifier, with or without a `0x` prefix.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        if hex_str.is_empty() {
            return Err(IdentifierError::Empty);
        }
        Self::new(hex::decode(hex_str)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.to_hex())
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Address> for Identifier {
    fn from(address: Address) -> Self {
        Self(Bytes::copy_from_slice(address.as_slice()))
    }
}
