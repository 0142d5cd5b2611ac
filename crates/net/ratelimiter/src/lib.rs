//! Per-caller rate limiting for inbound requests.
//!
//! A caller may issue at most one accepted request per `min_interval`.
//! Rejected requests do not refresh the caller's window, so a client that backs
//! off is admitted again once the interval has passed since its last accepted
//! request.
//!
//! At most `max_tracked` callers are remembered. When the table is full and
//! nothing has expired, requests from callers not already tracked are rejected
//! until an entry ages out. Concurrent first requests from distinct callers can
//! overshoot the cap by the number of racing callers.

use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;
use web_time::Instant;

/// Default cap on the number of tracked callers.
pub const DEFAULT_MAX_TRACKED: usize = 65_536;

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Minimum time between two accepted requests from the same caller.
    /// `Duration::ZERO` disables limiting.
    pub min_interval: Duration,
    /// Maximum number of tracked callers. Reaching it prunes expired entries,
    /// then turns away new callers if none expired.
    pub max_tracked: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::ZERO,
            max_tracked: DEFAULT_MAX_TRACKED,
        }
    }
}

impl RateLimiterConfig {
    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.min_interval.is_zero()
    }
}

/// The caller exceeded its allowed request rate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rate limit exceeded, retry in {retry_after:?}")]
pub struct RateLimited {
    /// Time until the caller would be admitted again.
    pub retry_after: Duration,
}

/// Minimum-interval limiter keyed by caller.
///
/// Each key is checked and updated under its own map shard, so callers never
/// contend with each other.
#[derive(Debug)]
pub struct RateLimiter<K: Eq + Hash> {
    config: RateLimiterConfig,
    last_accepted: DashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            last_accepted: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Check and record a request from `key` at the current time.
    pub fn check(&self, key: &K) -> Result<(), RateLimited> {
        self.check_at(key, Instant::now())
    }

    /// Check and record a request from `key` at `now`.
    pub fn check_at(&self, key: &K, now: Instant) -> Result<(), RateLimited> {
        if !self.config.is_enabled() {
            return Ok(());
        }

        // Sized before taking the entry: `len` locks every shard.
        let mut full = self.last_accepted.len() >= self.config.max_tracked;
        if full {
            self.prune(now);
            full = self.last_accepted.len() >= self.config.max_tracked;
        }

        match self.last_accepted.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let elapsed = now.saturating_duration_since(*entry.get());
                if elapsed < self.config.min_interval {
                    let retry_after = self.config.min_interval - elapsed;
                    trace!(?retry_after, "request rate limited");
                    return Err(RateLimited { retry_after });
                }
                entry.insert(now);
            }
            Entry::Vacant(_) if full => {
                let retry_after = self.config.min_interval;
                trace!(tracked = self.config.max_tracked, "caller table full");
                return Err(RateLimited { retry_after });
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
            }
        }
        Ok(())
    }

    /// Drop callers whose window has already expired at `now`.
    pub fn prune(&self, now: Instant) {
        let interval = self.config.min_interval;
        self.last_accepted
            .retain(|_, last| now.saturating_duration_since(*last) < interval);
    }

    /// Number of callers currently tracked.
    pub fn tracked(&self) -> usize {
        self.last_accepted.len()
    }
}
