use crate::rate_limit::store::SweepStats;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Limiter events emitted during admission and housekeeping.
///
/// Events carry the policy name but never the client key, so sinks can be
/// forwarded to shared observability backends without leaking caller addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyEvent {
    /// Admission decision events
    Admission(AdmissionEvent),
    /// Background sweep events
    Sweep(SweepEvent),
}

/// Events emitted by the HTTP middleware for each checked request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionEvent {
    /// The request was admitted and forwarded.
    Admitted {
        /// Policy that admitted the request
        policy: Arc<str>,
        /// Policy limit
        limit: u32,
        /// Budget left in the current window
        remaining: u32,
    },
    /// The request was rejected with `429 Too Many Requests`.
    Rejected {
        /// Policy whose budget was exhausted
        policy: Arc<str>,
        /// Policy limit
        limit: u32,
        /// Retry hint sent to the caller
        retry_after: Duration,
    },
}

/// Emitted once per limiter per sweep pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepEvent {
    /// Policy whose state was swept
    pub policy: Arc<str>,
    /// Timestamps dropped
    pub pruned_entries: usize,
    /// Client keys deleted
    pub removed_keys: usize,
    /// Client keys still tracked
    pub tracked_keys: usize,
}

impl PolicyEvent {
    /// Build a sweep event from the stats of one limiter.
    pub fn sweep(policy: Arc<str>, stats: SweepStats) -> Self {
        PolicyEvent::Sweep(SweepEvent {
            policy,
            pruned_entries: stats.pruned_entries,
            removed_keys: stats.removed_keys,
            tracked_keys: stats.tracked_keys,
        })
    }

    /// Name of the policy the event belongs to.
    pub fn policy(&self) -> &str {
        match self {
            PolicyEvent::Admission(AdmissionEvent::Admitted { policy, .. })
            | PolicyEvent::Admission(AdmissionEvent::Rejected { policy, .. })
            | PolicyEvent::Sweep(SweepEvent { policy, .. }) => policy,
        }
    }

    /// Short label for counters: `admitted`, `rejected` or `swept`.
    pub fn kind(&self) -> &'static str {
        match self {
            PolicyEvent::Admission(AdmissionEvent::Admitted { .. }) => "admitted",
            PolicyEvent::Admission(AdmissionEvent::Rejected { .. }) => "rejected",
            PolicyEvent::Sweep(_) => "swept",
        }
    }
}

impl fmt::Display for PolicyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyEvent::Admission(event) => write!(f, "Admission::{}", event),
            PolicyEvent::Sweep(event) => write!(f, "Sweep::{}", event),
        }
    }
}

impl fmt::Display for AdmissionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionEvent::Admitted { policy, limit, remaining } => {
                write!(f, "Admitted({}, {}/{} left)", policy, remaining, limit)
            }
            AdmissionEvent::Rejected { policy, limit, retry_after } => {
                write!(f, "Rejected({}, limit={}, retry_after={:?})", policy, limit, retry_after)
            }
        }
    }
}

impl fmt::Display for SweepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Swept({}, pruned={}, removed={}, tracked={})",
            self.policy, self.pruned_entries, self.removed_keys, self.tracked_keys
        )
    }
}
