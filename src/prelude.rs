//! Convenient re-exports for common Tollgate types.
pub use crate::{
    clock::{Clock, ManualClock, MonotonicClock},
    config::{RateLimitConfig, SweepConfig},
    error::{ConfigError, PolicyError},
    rate_limit::{
        policy::{API, AUTH, STRICT},
        Decision, KeyExtractor, LimiterRegistry, PeerIp, Policy, PolicyLimiter, RateLimitLayer,
        RateLimiter, Sweeper, SweeperHandle,
    },
    telemetry::{LogSink, MemorySink, NullSink, PolicyEvent, TelemetrySink},
};
