//! Outbound and inbound networking settings.

use std::time::Duration;

use meridian_net_backoff::{
    BackoffConfig, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
    DEFAULT_MULTIPLIER,
};
use meridian_net_dialer::DEFAULT_DIAL_TIMEOUT;
use meridian_net_ratelimiter::{DEFAULT_MAX_TRACKED, RateLimiterConfig};
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// `[backoff]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
            max_delay_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl BackoffSettings {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "backoff.multiplier must be at least 1.0, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }

    pub fn to_backoff_config(&self) -> BackoffConfig {
        BackoffConfig::default()
            .with_max_attempts(self.max_attempts)
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_multiplier(self.multiplier)
    }
}

/// `[rate_limit]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Zero disables rate limiting.
    pub min_interval_ms: u64,
    pub max_tracked: usize,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: 0,
            max_tracked: DEFAULT_MAX_TRACKED,
        }
    }
}

impl RateLimitSettings {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval_ms > 0 && self.max_tracked == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_tracked must be positive when limiting is enabled".into(),
            ));
        }
        Ok(())
    }

    pub fn to_rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            min_interval: Duration::from_millis(self.min_interval_ms),
            max_tracked: self.max_tracked,
        }
    }
}

/// `[dial]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialSettings {
    pub timeout_ms: u64,
}

impl Default for DialSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_DIAL_TIMEOUT.as_millis() as u64,
        }
    }
}

impl DialSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_backoff_crate() {
        assert_eq!(
            BackoffSettings::default().to_backoff_config(),
            BackoffConfig::default()
        );
        assert_eq!(
            RateLimitSettings::default().to_rate_limiter_config(),
            RateLimiterConfig::default()
        );
    }

    #[test]
    fn test_nan_multiplier_rejected() {
        let settings = BackoffSettings {
            multiplier: f64::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
