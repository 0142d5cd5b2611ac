//! Transport dialer abstraction.
//!
//! A [`Dialer`] turns a destination address into a live connection. The
//! connection is an owned value: dropping it releases the underlying transport
//! resources, so callers hold it for exactly one logical call and let scope
//! exit close it on every path.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use auto_impl::auto_impl;
use tracing::debug;

/// Default timeout for a single dial attempt.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from establishing a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialError {
    /// No route to the destination, or it refused the connection.
    #[error("cannot reach {destination}: {reason}")]
    Unreachable { destination: String, reason: String },
    /// The dial did not complete in time.
    #[error("dial to {destination} timed out after {timeout:?}")]
    Timeout {
        destination: String,
        timeout: Duration,
    },
    /// The destination address cannot be dialed by this transport.
    #[error("unsupported destination {0}")]
    Unsupported(String),
}

impl DialError {
    pub fn unreachable(destination: impl Display, reason: impl Into<String>) -> Self {
        Self::Unreachable {
            destination: destination.to_string(),
            reason: reason.into(),
        }
    }

    /// Transient failures are worth dialing again.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

/// Establishes connections to destinations of type `A`.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait Dialer<A: Sync + ?Sized>: Send + Sync {
    /// Connection handle; dropping it closes the connection.
    type Connection: Send + Sync;

    async fn dial(&self, destination: &A) -> Result<Self::Connection, DialError>;
}

/// Wraps a dialer and bounds every dial with a timeout.
#[derive(Debug, Clone)]
pub struct TimeoutDialer<D> {
    inner: D,
    timeout: Duration,
}

impl<D> TimeoutDialer<D> {
    pub fn new(inner: D, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn with_default_timeout(inner: D) -> Self {
        Self::new(inner, DEFAULT_DIAL_TIMEOUT)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<A, D> Dialer<A> for TimeoutDialer<D>
where
    A: Display + Sync + ?Sized,
    D: Dialer<A>,
{
    type Connection = D::Connection;

    async fn dial(&self, destination: &A) -> Result<Self::Connection, DialError> {
        match tokio::time::timeout(self.timeout, self.inner.dial(destination)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(%destination, timeout = ?self.timeout, "dial timed out");
                Err(DialError::Timeout {
                    destination: destination.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}
