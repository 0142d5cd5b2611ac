use std::time::Duration;

use meridian_swarm_topology::{DEFAULT_MAX_QUERY_RESULTS, TopologyConfig};
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// `[topology]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologySettings {
    /// Maximum records returned per query.
    pub max_query_results: usize,
    /// Pong back to every peer whose ping was accepted.
    pub reciprocate_pings: bool,
    /// Bound on a reciprocal pong, dial included.
    pub reciprocate_timeout_ms: u64,
}

impl Default for TopologySettings {
    fn default() -> Self {
        let defaults = TopologyConfig::default();
        Self {
            max_query_results: defaults.max_query_results,
            reciprocate_pings: defaults.reciprocate_pings,
            reciprocate_timeout_ms: defaults.reciprocate_timeout.as_millis() as u64,
        }
    }
}

impl TopologySettings {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_query_results == 0 {
            return Err(ConfigError::Invalid(
                "topology.max_query_results must be positive".into(),
            ));
        }
        if self.reciprocate_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "topology.reciprocate_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn reciprocate_timeout(&self) -> Duration {
        Duration::from_millis(self.reciprocate_timeout_ms)
    }

    pub fn to_topology_config(&self) -> TopologyConfig {
        TopologyConfig::default()
            .with_max_query_results(self.max_query_results)
            .with_reciprocate_pings(self.reciprocate_pings)
            .with_reciprocate_timeout(self.reciprocate_timeout())
    }
}
