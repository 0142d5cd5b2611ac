//! Mapping between [`SwarmError`] and [`tonic::Status`].
//!
//! Outbound, every error becomes a status with a user-facing message; store
//! failures are reported without their internal detail. Inbound, status codes
//! map back into the taxonomy so that only transport-level codes are retried.
//! `Internal` is only produced by a remote core that reached its store and
//! failed, so it maps to a rejection rather than a transport failure.

use meridian_swarm_api::{CoreError, SwarmError};
use tonic::{Code, Status};

/// Convert an error into the status sent to a remote caller.
pub trait IntoStatus {
    fn into_status(self) -> Status;
}

/// Reconstruct an error from a status received from a remote peer.
pub trait FromStatus {
    fn from_status(status: Status) -> Self;
}

impl IntoStatus for SwarmError {
    fn into_status(self) -> Status {
        let message = self.to_string();
        match self {
            Self::NilRequest(_)
            | Self::InvalidAddress(_)
            | Self::InvalidIdentifier
            | Self::RemoteInvalidInput(_)
            | Self::Parse(_) => Status::invalid_argument(message),
            Self::Dial(_) | Self::Transport(_) => Status::unavailable(message),
            Self::Registration(CoreError::Store(_)) => Status::internal("cannot update store"),
            Self::Lookup(CoreError::Store(_)) => Status::internal("cannot query closest peers"),
            Self::Registration(CoreError::Cancelled)
            | Self::Lookup(CoreError::Cancelled)
            | Self::Cancelled => Status::cancelled(message),
            Self::Registration(_) | Self::Lookup(_) | Self::Rejected(_) => {
                Status::failed_precondition(message)
            }
            Self::StoreLookup(_) => Status::internal("cannot get self address"),
            Self::RateLimitExceeded => Status::resource_exhausted(message),
        }
    }
}

impl FromStatus for SwarmError {
    fn from_status(status: Status) -> Self {
        let message = status.message().to_owned();
        match status.code() {
            Code::Unavailable
            | Code::DeadlineExceeded
            | Code::Unknown
            | Code::Aborted
            | Code::DataLoss => Self::Transport(format!("{:?}: {message}", status.code())),
            Code::ResourceExhausted => Self::RateLimitExceeded,
            Code::InvalidArgument => Self::RemoteInvalidInput(message),
            Code::Cancelled => Self::Cancelled,
            _ => Self::Rejected(message),
        }
    }
}
