use std::time::Duration;

/// Default cap on records returned from a closest-peer query.
pub const DEFAULT_MAX_QUERY_RESULTS: usize = 20;

/// Default bound on a reciprocal pong, dial included.
pub const DEFAULT_RECIPROCATE_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for [`KademliaCore`](crate::KademliaCore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyConfig {
    /// Maximum number of records returned by a query.
    pub max_query_results: usize,

    /// Pong the sender of every accepted ping, when a responder is attached.
    pub reciprocate_pings: bool,

    /// Longest an accepted ping waits on its reciprocal pong before answering.
    pub reciprocate_timeout: Duration,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            max_query_results: DEFAULT_MAX_QUERY_RESULTS,
            reciprocate_pings: true,
            reciprocate_timeout: DEFAULT_RECIPROCATE_TIMEOUT,
        }
    }
}

impl TopologyConfig {
    pub fn with_max_query_results(mut self, max_query_results: usize) -> Self {
        self.max_query_results = max_query_results;
        self
    }

    pub fn with_reciprocate_pings(mut self, reciprocate_pings: bool) -> Self {
        self.reciprocate_pings = reciprocate_pings;
        self
    }

    pub fn with_reciprocate_timeout(mut self, timeout: Duration) -> Self {
        self.reciprocate_timeout = timeout;
        self
    }
}
