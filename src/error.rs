//! Error types for policy and configuration validation.
//!
//! Admission itself never fails: a limiter answers with a [`Decision`](crate::Decision).
//! These errors only surface while building policies, configs and registries.
use std::time::Duration;

use thiserror::Error;

/// Errors produced when validating a single [`Policy`](crate::Policy).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// `max_requests` must be > 0.
    #[error("max_requests must be > 0 (got {provided})")]
    ZeroLimit {
        /// Value provided by caller.
        provided: u32,
    },
    /// The window must be longer than zero.
    #[error("window must be > 0 (got {0:?})")]
    ZeroWindow(Duration),
}

/// Errors produced when validating a [`RateLimitConfig`](crate::RateLimitConfig)
/// or looking up a limiter in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A named policy failed validation.
    #[error("policy '{name}' is invalid: {source}")]
    Policy {
        /// Name of the offending policy.
        name: String,
        /// Underlying validation error.
        #[source]
        source: PolicyError,
    },
    /// Policy names must be non-empty.
    #[error("policy name must not be empty")]
    EmptyPolicyName,
    /// The sweep interval must be > 0.
    #[error("sweep interval must be > 0")]
    ZeroSweepInterval,
    /// The sweep retention horizon must cover every policy window, otherwise the
    /// sweep would discard history a limiter still counts.
    #[error("sweep retention {retention:?} is shorter than the {window:?} window of policy '{policy}'")]
    RetentionTooShort {
        /// Configured retention horizon.
        retention: Duration,
        /// Window of the policy that exceeds it.
        window: Duration,
        /// Name of that policy.
        policy: String,
    },
    /// The requested policy is not registered.
    #[error("rate limit policy '{name}' not found")]
    UnknownPolicy {
        /// Identifier that could not be located.
        name: String,
    },
}
