//! Rate limiting configuration: named policies plus sweep cadence.
//!
//! The default config mirrors a typical deployment: `auth` 10/min, `api` 100/min,
//! `strict` 50/min, swept every minute with a ten-minute retention horizon.
//!
//! ```
//! use tollgate::{Policy, RateLimitConfig};
//! use std::time::Duration;
//!
//! let config = RateLimitConfig::builder()
//!     .policy("auth", Policy::auth())
//!     .policy("uploads", Policy::new(5, Duration::from_secs(300)).unwrap())
//!     .retention(Duration::from_secs(600))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.policies().len(), 2);
//! ```

use crate::error::ConfigError;
use crate::rate_limit::policy::{self, Policy};
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_RETENTION_SECS: u64 = 10 * 60;

/// How often the background sweep runs and how much history it keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawSweepConfig"))]
pub struct SweepConfig {
    /// Delay between sweep passes.
    pub interval: Duration,
    /// Timestamps older than this are dropped by the sweep.
    pub retention: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            retention: Duration::from_secs(DEFAULT_RETENTION_SECS),
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSweepConfig {
    interval_secs: u64,
    retention_secs: u64,
}

#[cfg(feature = "serde")]
impl Default for RawSweepConfig {
    fn default() -> Self {
        Self { interval_secs: DEFAULT_SWEEP_INTERVAL_SECS, retention_secs: DEFAULT_RETENTION_SECS }
    }
}

#[cfg(feature = "serde")]
impl From<RawSweepConfig> for SweepConfig {
    fn from(raw: RawSweepConfig) -> Self {
        Self {
            interval: Duration::from_secs(raw.interval_secs),
            retention: Duration::from_secs(raw.retention_secs),
        }
    }
}

/// Validated set of named policies and sweep settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawRateLimitConfig"))]
pub struct RateLimitConfig {
    policies: BTreeMap<String, Policy>,
    sweep: SweepConfig,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRateLimitConfig {
    policies: BTreeMap<String, Policy>,
    #[serde(default)]
    sweep: SweepConfig,
}

#[cfg(feature = "serde")]
impl TryFrom<RawRateLimitConfig> for RateLimitConfig {
    type Error = ConfigError;

    fn try_from(raw: RawRateLimitConfig) -> Result<Self, Self::Error> {
        let config = Self { policies: raw.policies, sweep: raw.sweep };
        config.validate()?;
        Ok(config)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let policies = BTreeMap::from([
            (policy::AUTH.to_owned(), Policy::auth()),
            (policy::API.to_owned(), Policy::api()),
            (policy::STRICT.to_owned(), Policy::strict()),
        ]);
        Self { policies, sweep: SweepConfig::default() }
    }
}

impl RateLimitConfig {
    /// Start an empty builder (no policies, default sweep settings).
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::default()
    }

    /// Named policies, ordered by name.
    pub fn policies(&self) -> &BTreeMap<String, Policy> {
        &self.policies
    }

    /// Look up one policy.
    pub fn policy(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    /// Sweep cadence and horizon.
    pub fn sweep(&self) -> SweepConfig {
        self.sweep
    }

    /// Largest window among all policies, if any.
    pub fn largest_window(&self) -> Option<Duration> {
        self.policies.values().map(Policy::window).max()
    }

    /// Check names, sweep interval, and that retention covers every window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep.interval.is_zero() {
            return Err(ConfigError::ZeroSweepInterval);
        }
        for (name, policy) in &self.policies {
            if name.is_empty() {
                return Err(ConfigError::EmptyPolicyName);
            }
            if policy.window() > self.sweep.retention {
                return Err(ConfigError::RetentionTooShort {
                    retention: self.sweep.retention,
                    window: policy.window(),
                    policy: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`RateLimitConfig`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct RateLimitConfigBuilder {
    policies: BTreeMap<String, Policy>,
    sweep: SweepConfig,
}

impl RateLimitConfigBuilder {
    /// Add or replace a named policy.
    pub fn policy(mut self, name: impl Into<String>, policy: Policy) -> Self {
        self.policies.insert(name.into(), policy);
        self
    }

    /// Add a policy from raw values, surfacing validation errors at build time.
    pub fn try_policy(
        self,
        name: impl Into<String>,
        max_requests: u32,
        window: Duration,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        match Policy::new(max_requests, window) {
            Ok(policy) => Ok(self.policy(name, policy)),
            Err(source) => Err(ConfigError::Policy { name, source }),
        }
    }

    /// Delay between sweep passes.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep.interval = interval;
        self
    }

    /// History kept by the sweep.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.sweep.retention = retention;
        self
    }

    /// Validate and produce the config.
    pub fn build(self) -> Result<RateLimitConfig, ConfigError> {
        let config = RateLimitConfig { policies: self.policies, sweep: self.sweep };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyError;

    #[test]
    fn default_config_is_valid() {
        let config = RateLimitConfig::default();
        config.validate().unwrap();
        assert_eq!(config.policies().len(), 3);
        assert_eq!(config.policy("auth"), Some(&Policy::auth()));
        assert_eq!(config.sweep().interval, Duration::from_secs(60));
        assert_eq!(config.sweep().retention, Duration::from_secs(600));
        assert_eq!(config.largest_window(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn retention_must_cover_largest_window() {
        let err = RateLimitConfig::builder()
            .policy("reports", Policy::new(2, Duration::from_secs(3600)).unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RetentionTooShort { ref policy, .. } if policy == "reports"));
    }

    #[test]
    fn zero_interval_rejected() {
        let err = RateLimitConfig::builder().sweep_interval(Duration::ZERO).build().unwrap_err();
        assert_eq!(err, ConfigError::ZeroSweepInterval);
    }

    #[test]
    fn empty_name_rejected() {
        let err = RateLimitConfig::builder().policy("", Policy::api()).build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyPolicyName);
    }

    #[test]
    fn try_policy_wraps_policy_errors() {
        let err = RateLimitConfig::builder().try_policy("auth", 0, Duration::from_secs(60)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Policy { name: "auth".into(), source: PolicyError::ZeroLimit { provided: 0 } }
        );
    }
}
