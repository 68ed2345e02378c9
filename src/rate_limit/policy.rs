//! Admission budgets: a `(max_requests, window)` pair plus the standard presets.

use crate::error::PolicyError;
use std::time::Duration;

/// Name of the login/registration policy.
pub const AUTH: &str = "auth";
/// Name of the general authenticated API policy.
pub const API: &str = "api";
/// Name of the policy guarding sensitive admin operations.
pub const STRICT: &str = "strict";

const DEFAULT_WINDOW_SECS: u64 = 60;
const AUTH_MAX_REQUESTS: u32 = 10;
const API_MAX_REQUESTS: u32 = 100;
const STRICT_MAX_REQUESTS: u32 = 50;

/// Validated admission budget. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Policy {
    max_requests: u32,
    window: Duration,
}

impl Policy {
    /// Create a policy, rejecting a zero limit or a zero window.
    ///
    /// # Examples
    /// ```
    /// use tollgate::Policy;
    /// use std::time::Duration;
    /// let policy = Policy::new(3, Duration::from_secs(1)).unwrap();
    /// assert_eq!(policy.max_requests(), 3);
    /// assert!(Policy::new(0, Duration::from_secs(1)).is_err());
    /// ```
    pub fn new(max_requests: u32, window: Duration) -> Result<Self, PolicyError> {
        if max_requests == 0 {
            return Err(PolicyError::ZeroLimit { provided: max_requests });
        }
        if window.is_zero() {
            return Err(PolicyError::ZeroWindow(window));
        }
        Ok(Self { max_requests, window })
    }

    /// 10 requests per minute; login and registration routes.
    pub const fn auth() -> Self {
        Self { max_requests: AUTH_MAX_REQUESTS, window: Duration::from_secs(DEFAULT_WINDOW_SECS) }
    }

    /// 100 requests per minute; general authenticated API routes.
    pub const fn api() -> Self {
        Self { max_requests: API_MAX_REQUESTS, window: Duration::from_secs(DEFAULT_WINDOW_SECS) }
    }

    /// 50 requests per minute; sensitive admin operations.
    pub const fn strict() -> Self {
        Self { max_requests: STRICT_MAX_REQUESTS, window: Duration::from_secs(DEFAULT_WINDOW_SECS) }
    }

    /// Maximum admissions inside any trailing window.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Length of the trailing window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Window in whole seconds, rounded up and never below 1.
    /// This is the value reported in `Retry-After`.
    pub fn window_secs(&self) -> u64 {
        let secs = self.window.as_secs();
        let secs = if self.window.subsec_nanos() > 0 { secs.saturating_add(1) } else { secs };
        secs.max(1)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Policy;
    use crate::error::PolicyError;
    use std::time::Duration;

    #[derive(serde::Deserialize)]
    #[serde(deny_unknown_fields)]
    pub(super) struct RawPolicy {
        max_requests: u32,
        window_secs: u64,
    }

    impl TryFrom<RawPolicy> for Policy {
        type Error = PolicyError;

        fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
            Policy::new(raw.max_requests, Duration::from_secs(raw.window_secs))
        }
    }

    impl<'de> serde::Deserialize<'de> for Policy {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let raw = RawPolicy::deserialize(deserializer)?;
            Policy::try_from(raw).map_err(serde::de::Error::custom)
        }
    }
}
