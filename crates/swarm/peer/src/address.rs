use std::fmt;
use std::str::FromStr;

use libp2p::Multiaddr;

use crate::{AddressParseError, Identifier};

/// Protocol component separating the transport location from the identifier.
pub const PROTOCOL_TAG: &str = "meridian";

/// Network address of a peer: transport location plus peer identifier.
///
/// Canonical form: `<transport multiaddr>/meridian/<hex identifier>`, e.g.
/// `/ip4/10.0.0.1/tcp/18514/meridian/5a1f`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultiAddress {
    transport: Multiaddr,
    identifier: Identifier,
}

impl MultiAddress {
    pub fn new(transport: Multiaddr, identifier: Identifier) -> Self {
        Self {
            transport,
            identifier,
        }
    }

    pub fn transport(&self) -> &Multiaddr {
        &self.transport
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// True when either the transport or the identifier is missing.
    pub fn is_empty(&self) -> bool {
        self.transport.is_empty() || self.identifier.is_empty()
    }
}

impl Default for MultiAddress {
    fn default() -> Self {
        Self::new(Multiaddr::empty(), Identifier::default())
    }
}

impl fmt::Display for MultiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.transport.is_empty() && self.identifier.is_empty() {
            return Ok(());
        }
        write!(f, "{}/{}/{}", self.transport, PROTOCOL_TAG, self.identifier)
    }
}

impl FromStr for MultiAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AddressParseError::Empty);
        }

        let separator = format!("/{PROTOCOL_TAG}/");
        let (transport, identifier) = s
            .rsplit_once(separator.as_str())
            .ok_or(AddressParseError::MissingIdentifier)?;

        if transport.is_empty() {
            return Err(AddressParseError::MissingTransport);
        }

        Ok(Self {
            transport: transport.parse()?,
            identifier: Identifier::parse(identifier)?,
        })
    }
}
