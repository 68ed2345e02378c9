//! Registry of named limiters.
//!
//! Each policy owns independent state: spending the `auth` budget never touches
//! `api`. The registry is cheap to clone and is what the sweeper walks.

use crate::clock::{Clock, MonotonicClock};
use crate::config::RateLimitConfig;
use crate::error::ConfigError;
use crate::rate_limit::limiter::PolicyLimiter;
use crate::rate_limit::policy;
use crate::rate_limit::store::SweepStats;
use crate::telemetry::PolicyEvent;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Named limiters plus the retention horizon used to sweep them.
#[derive(Debug, Clone)]
pub struct LimiterRegistry {
    limiters: Arc<BTreeMap<String, PolicyLimiter>>,
    retention: Duration,
    interval: Duration,
}

impl LimiterRegistry {
    /// `auth`, `api` and `strict` with the default sweep settings.
    pub fn standard() -> Self {
        Self::build(&RateLimitConfig::default(), Arc::new(MonotonicClock::default()))
    }

    /// Build one limiter per configured policy after validating the config.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, ConfigError> {
        Self::from_config_with_clock(config, MonotonicClock::default())
    }

    /// Like [`from_config`](Self::from_config) with every limiter reading `clock`.
    pub fn from_config_with_clock<C: Clock + 'static>(
        config: &RateLimitConfig,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, Arc::new(clock)))
    }

    fn build(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let limiters = config
            .policies()
            .iter()
            .map(|(name, policy)| {
                let limiter =
                    PolicyLimiter::new(name.as_str(), *policy).with_shared_clock(clock.clone());
                (name.clone(), limiter)
            })
            .collect();
        let sweep = config.sweep();
        Self { limiters: Arc::new(limiters), retention: sweep.retention, interval: sweep.interval }
    }

    /// Get a limiter handle by name. Handles share state with the registry.
    pub fn get(&self, name: &str) -> Option<PolicyLimiter> {
        self.limiters.get(name).cloned()
    }

    /// Get a limiter by name, erroring if missing.
    pub fn require(&self, name: &str) -> Result<PolicyLimiter, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownPolicy { name: name.to_owned() })
    }

    /// The `auth` limiter, if configured.
    pub fn auth(&self) -> Option<PolicyLimiter> {
        self.get(policy::AUTH)
    }

    /// The `api` limiter, if configured.
    pub fn api(&self) -> Option<PolicyLimiter> {
        self.get(policy::API)
    }

    /// The `strict` limiter, if configured.
    pub fn strict(&self) -> Option<PolicyLimiter> {
        self.get(policy::STRICT)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.limiters.keys().map(String::as_str).collect()
    }

    /// Horizon applied by [`sweep_all`](Self::sweep_all).
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Cadence the background sweeper should use.
    pub fn sweep_interval(&self) -> Duration {
        self.interval
    }

    /// Sweep every limiter with the retention horizon. Results are sorted by name.
    pub fn sweep_all(&self) -> Vec<(Arc<str>, SweepStats)> {
        self.limiters
            .values()
            .map(|limiter| (limiter.shared_name(), limiter.sweep(self.retention)))
            .collect()
    }

    /// Run [`sweep_all`](Self::sweep_all) and turn the results into telemetry events.
    pub(crate) fn sweep_events(&self) -> Vec<PolicyEvent> {
        self.sweep_all()
            .into_iter()
            .map(|(policy, stats)| {
                tracing::debug!(
                    policy = %policy,
                    pruned_entries = stats.pruned_entries,
                    removed_keys = stats.removed_keys,
                    tracked_keys = stats.tracked_keys,
                    "rate limit sweep"
                );
                PolicyEvent::sweep(policy, stats)
            })
            .collect()
    }

    /// Total number of tracked client keys across all limiters.
    pub fn tracked_keys(&self) -> usize {
        self.limiters.values().map(|l| l.store().tracked_keys()).sum()
    }
}

impl Default for LimiterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
