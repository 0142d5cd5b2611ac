//! Error types for swarm discovery operations.
//!
//! [`SwarmError`] is what callers of the client and the service see.
//! [`CoreError`] is what a [`SwarmCore`](crate::SwarmCore) reports; the
//! service wraps it as [`SwarmError::Registration`] or [`SwarmError::Lookup`].

use meridian_net_backoff::Retryable;
use meridian_net_dialer::DialError;
use meridian_net_peer_store::StoreError;
use meridian_swarm_peer::{AddressParseError, IdentifierError, RecordError, VerifyError};

/// Coarse classification of a [`SwarmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The request or argument was malformed or missing.
    InvalidInput,
    /// An address string could not be parsed.
    ParseFailure,
    /// The peer could not be reached or the exchange broke off.
    TransportFailure,
    /// The core deliberately refused the request.
    CoreRejection,
    /// The local store could not provide a record.
    StoreFailure,
    /// The caller is sending requests too quickly.
    RateLimitExceeded,
    /// The operation was cancelled by its caller.
    Cancelled,
}

/// Error type for swarm client and service operations.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    /// A required request message was absent.
    #[error("{0} request is nil")]
    NilRequest(&'static str),

    /// The address to send or register is empty or otherwise invalid.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] RecordError),

    /// The query target identifier is empty.
    #[error("identifier is empty")]
    InvalidIdentifier,

    /// The remote reported that our request was malformed.
    #[error("remote rejected request as invalid: {0}")]
    RemoteInvalidInput(String),

    /// An address or identifier string could not be parsed.
    #[error("cannot parse address: {0}")]
    Parse(#[from] AddressParseError),

    /// The transport could not open a connection.
    #[error("cannot dial peer: {0}")]
    Dial(String),

    /// The request was sent but the exchange failed in transit.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The core refused an advertised record.
    #[error("cannot update store: {0}")]
    Registration(#[source] CoreError),

    /// The core could not answer a closest-peer lookup.
    #[error("cannot query closest peers: {0}")]
    Lookup(#[source] CoreError),

    /// The remote deliberately refused the request.
    #[error("rejected by remote: {0}")]
    Rejected(String),

    /// The local node's own record could not be retrieved.
    #[error("cannot get self address: {0}")]
    StoreLookup(String),

    /// The caller exceeded its request rate.
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl SwarmError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NilRequest(_)
            | Self::InvalidAddress(_)
            | Self::InvalidIdentifier
            | Self::RemoteInvalidInput(_) => ErrorKind::InvalidInput,
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::Dial(_) | Self::Transport(_) => ErrorKind::TransportFailure,
            Self::Registration(_) | Self::Lookup(_) | Self::Rejected(_) => {
                ErrorKind::CoreRejection
            }
            Self::StoreLookup(_) => ErrorKind::StoreFailure,
            Self::RateLimitExceeded => ErrorKind::RateLimitExceeded,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether this error came from cancellation rather than a peer failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl Retryable for SwarmError {
    fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransportFailure
    }
}

impl From<DialError> for SwarmError {
    fn from(err: DialError) -> Self {
        Self::Dial(err.to_string())
    }
}

impl From<IdentifierError> for SwarmError {
    fn from(err: IdentifierError) -> Self {
        Self::Parse(AddressParseError::Identifier(err))
    }
}

/// Error type for [`SwarmCore`](crate::SwarmCore) operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The record failed structural validation.
    #[error("invalid address record: {0}")]
    InvalidRecord(#[source] RecordError),

    /// The record advertises the local node itself.
    #[error("record advertises the local node")]
    SelfAddress,

    /// The record's signature does not prove its identifier.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] VerifyError),

    /// A record with an equal or higher nonce is already known.
    #[error("stale nonce {received}, current is {current}")]
    StaleNonce {
        /// Nonce of the stored record.
        current: u64,
        /// Nonce of the refused record.
        received: u64,
    },

    /// The address store failed.
    #[error("store error: {0}")]
    Store(String),

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidRecord => Self::InvalidRecord(RecordError::EmptyAddress),
            StoreError::Storage(message) => Self::Store(message),
        }
    }
}
