use crate::clock::Clock;
use crate::rate_limit::policy::Policy;
use crate::rate_limit::store::{SlidingWindowStore, SweepStats};
use crate::rate_limit::{Decision, RateLimiter};
use std::sync::Arc;
use std::time::Duration;

/// A named sliding-window limiter: one [`Policy`] bound to its own state.
///
/// Clones share the same store, so a limiter handed to several middleware
/// instances enforces a single budget per client.
#[derive(Debug, Clone)]
pub struct PolicyLimiter {
    name: Arc<str>,
    policy: Policy,
    store: SlidingWindowStore,
}

impl PolicyLimiter {
    /// Create a limiter with fresh state.
    pub fn new(name: impl Into<Arc<str>>, policy: Policy) -> Self {
        Self { name: name.into(), policy, store: SlidingWindowStore::new() }
    }

    /// `auth` preset (10/min) with fresh state.
    pub fn auth() -> Self {
        Self::new(crate::rate_limit::policy::AUTH, Policy::auth())
    }

    /// `api` preset (100/min) with fresh state.
    pub fn api() -> Self {
        Self::new(crate::rate_limit::policy::API, Policy::api())
    }

    /// `strict` preset (50/min) with fresh state.
    pub fn strict() -> Self {
        Self::new(crate::rate_limit::policy::STRICT, Policy::strict())
    }

    /// Override the clock (useful for deterministic tests).
    ///
    /// This installs a fresh, empty store. Clones taken before the call keep
    /// the old store and no longer share budgets with the returned limiter, so
    /// set the clock before handing the limiter to a layer or registry.
    ///
    /// # Example
    /// ```
    /// use tollgate::{ManualClock, Policy, PolicyLimiter};
    /// use std::time::Duration;
    /// let clock = ManualClock::new();
    /// let limiter = PolicyLimiter::new("login", Policy::new(1, Duration::from_secs(1)).unwrap())
    ///     .with_clock(clock.clone());
    /// assert!(limiter.is_allowed("10.0.0.1"));
    /// assert!(!limiter.is_allowed("10.0.0.1"));
    /// clock.advance(Duration::from_secs(1));
    /// assert!(limiter.is_allowed("10.0.0.1"));
    /// ```
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.store = SlidingWindowStore::with_clock(clock);
        self
    }

    // Same caveat as `with_clock`: earlier clones keep the old store.
    pub(crate) fn with_shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.store = SlidingWindowStore::with_shared_clock(clock);
        self
    }

    /// Boolean form of [`RateLimiter::check`].
    pub fn is_allowed(&self, key: &str) -> bool {
        self.check(key).is_allowed()
    }

    /// Sweep this limiter's state; see [`SlidingWindowStore::sweep`].
    pub fn sweep(&self, horizon: Duration) -> SweepStats {
        self.store.sweep(horizon)
    }

    /// Access the underlying state (instrumentation, resets).
    pub fn store(&self) -> &SlidingWindowStore {
        &self.store
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }
}

impl RateLimiter for PolicyLimiter {
    fn name(&self) -> &str {
        &self.name
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn check(&self, key: &str) -> Decision {
        let decision = self.store.check(key, &self.policy);
        if let Decision::Denied { limit, window, .. } = decision {
            tracing::debug!(
                policy = %self.name,
                client = %key,
                limit,
                window_secs = window.as_secs(),
                "rate limit exceeded"
            );
        }
        decision
    }
}
