//! Rate limiting primitives.
//!
//! This module provides the building blocks for rate limiting:
//! - [`RateLimiter`]: The core trait for admission decisions.
//! - [`RateLimitLayer`]: Tower middleware that enforces a limiter on HTTP requests.
//! - [`Decision`]: The result of a rate limit check (Allowed/Denied).
//!
//! # Architecture
//!
//! The system is designed to be modular:
//! - **Middleware**: `RateLimitLayer` wraps your service. It doesn't know *how* limiting works,
//!   only that it should ask a `RateLimiter` about the key a [`KeyExtractor`] derives.
//! - **Logic**: [`PolicyLimiter`] binds a [`Policy`] to its own sliding-window state.
//! - **Storage**: [`SlidingWindowStore`] (in `store` module) owns the per-client request logs.
//! - **Housekeeping**: [`LimiterRegistry`] groups the named limiters and [`Sweeper`]
//!   periodically reclaims history of clients that went quiet.

use std::time::Duration;

pub mod key;
pub mod limiter;
pub mod middleware;
pub mod policy;
pub mod registry;
pub mod store;
pub mod sweeper;

pub use key::{HeaderKey, KeyExtractor, PeerIp, UNKNOWN_CLIENT};
pub use limiter::PolicyLimiter;
pub use middleware::{RateLimitLayer, RateLimitService};
pub use policy::Policy;
pub use registry::LimiterRegistry;
pub use store::{SlidingWindowStore, SweepStats};
pub use sweeper::{Sweeper, SweeperHandle};

/// The decision returned by a rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request is allowed to proceed.
    Allowed {
        /// Policy limit. Useful for `X-RateLimit-Limit` headers.
        limit: u32,
        /// Number of admissions left in the current window after this one.
        /// Useful for `X-RateLimit-Remaining` headers.
        remaining: u32,
    },
    /// The request is denied.
    Denied {
        /// Policy limit that was exceeded.
        limit: u32,
        /// Window the limit applies to.
        window: Duration,
        /// How long the caller should wait before retrying.
        /// Useful for `Retry-After` headers.
        retry_after: Duration,
    },
}

impl Decision {
    /// Helper to check if allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Policy limit, whichever way the decision went.
    pub fn limit(&self) -> u32 {
        match self {
            Decision::Allowed { limit, .. } | Decision::Denied { limit, .. } => *limit,
        }
    }
}

/// Core interface for admission decisions.
///
/// Checks are synchronous and never block on I/O; implementations hold a lock for
/// the duration of one prune-and-append step at most.
pub trait RateLimiter: Send + Sync {
    /// Name used in logs, telemetry and error messages.
    fn name(&self) -> &str;

    /// Budget enforced by this limiter.
    fn policy(&self) -> &Policy;

    /// Decide whether `key` may proceed now, recording the request if so.
    fn check(&self, key: &str) -> Decision;
}

impl<L: RateLimiter + ?Sized> RateLimiter for std::sync::Arc<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn policy(&self) -> &Policy {
        (**self).policy()
    }

    fn check(&self, key: &str) -> Decision {
        (**self).check(key)
    }
}
