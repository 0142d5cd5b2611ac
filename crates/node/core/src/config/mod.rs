//! Node configuration handling.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration:
//!
//! ```toml
//! [backoff]
//! max_attempts = 5
//! initial_delay_ms = 100
//! max_delay_ms = 5000
//! multiplier = 2.0
//!
//! [rate_limit]
//! min_interval_ms = 0
//! max_tracked = 65536
//!
//! [topology]
//! max_query_results = 20
//! reciprocate_pings = true
//! reciprocate_timeout_ms = 2000
//!
//! [dial]
//! timeout_ms = 10000
//! ```

mod network;
mod topology;

pub use network::{BackoffSettings, DialSettings, RateLimitSettings};
pub use topology::TopologySettings;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors from loading or validating a [`NodeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a Meridian node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Retry policy for outbound calls.
    pub backoff: BackoffSettings,

    /// Inbound request rate limiting.
    pub rate_limit: RateLimitSettings,

    /// Closest-peer lookup and ping handling.
    pub topology: TopologySettings,

    /// Outbound connection establishment.
    pub dial: DialSettings,
}

impl NodeConfig {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backoff.validate()?;
        self.rate_limit.validate()?;
        self.topology.validate()?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
