//! Per-client request logs behind a single lock.

use crate::clock::{Clock, MonotonicClock};
use crate::rate_limit::policy::Policy;
use crate::rate_limit::Decision;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Result of one sweep pass over a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Timestamps dropped because they aged past the horizon.
    pub pruned_entries: usize,
    /// Client keys deleted because their log emptied.
    pub removed_keys: usize,
    /// Client keys still tracked after the pass.
    pub tracked_keys: usize,
}

type RequestLog = VecDeque<u64>;

/// Sliding-log state for one named limiter: client key -> admitted timestamps (millis).
///
/// Clones share the same underlying map via `Arc`. Every operation takes one
/// exclusive lock over the whole map, so the prune/count/append sequence for a
/// key is atomic and the sweep never interleaves with an admission check.
#[derive(Debug, Clone)]
pub struct SlidingWindowStore {
    logs: Arc<Mutex<HashMap<String, RequestLog>>>,
    clock: Arc<dyn Clock>,
}

impl Default for SlidingWindowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SlidingWindowStore {
    /// Create an empty store reading time from a [`MonotonicClock`].
    pub fn new() -> Self {
        Self::with_shared_clock(Arc::new(MonotonicClock::default()))
    }

    /// Create an empty store reading time from `clock`.
    pub fn with_clock<C: Clock + 'static>(clock: C) -> Self {
        Self::with_shared_clock(Arc::new(clock))
    }

    pub(crate) fn with_shared_clock(clock: Arc<dyn Clock>) -> Self {
        Self { logs: Arc::new(Mutex::new(HashMap::new())), clock }
    }

    /// Decide whether `key` may make another request under `(max_requests, window)`.
    ///
    /// Entries at least `window` old are discarded for good. A denied attempt is
    /// not recorded, so a burst of rejected calls never extends the lockout.
    pub fn is_allowed(&self, key: &str, max_requests: u32, window: Duration) -> bool {
        self.admit(key, max_requests, window).is_ok()
    }

    /// Same admission rule as [`is_allowed`](Self::is_allowed), reporting the
    /// remaining budget or the retry hint through a [`Decision`].
    pub fn check(&self, key: &str, policy: &Policy) -> Decision {
        let limit = policy.max_requests();
        match self.admit(key, limit, policy.window()) {
            Ok(remaining) => Decision::Allowed { limit, remaining },
            Err(()) => Decision::Denied { limit, window: policy.window(), retry_after: policy.window() },
        }
    }

    /// Returns the budget left after admitting, or `Err(())` on denial.
    fn admit(&self, key: &str, max_requests: u32, window: Duration) -> Result<u32, ()> {
        let now = self.clock.now_millis();
        let window_ms = duration_millis(window);
        let max = max_requests as usize;
        let mut logs = self.lock();

        match logs.get_mut(key) {
            Some(log) => {
                prune_older_than(log, now, window_ms);
                if log.len() >= max {
                    if log.is_empty() {
                        logs.remove(key);
                    }
                    return Err(());
                }
                log.push_back(now);
                Ok(remaining(max, log.len()))
            }
            None => {
                if max == 0 {
                    return Err(());
                }
                logs.insert(key.to_owned(), VecDeque::from([now]));
                Ok(remaining(max, 1))
            }
        }
    }

    /// Drop timestamps older than `horizon` across every key and delete keys whose
    /// log empties. `horizon` must be at least the largest window ever checked
    /// against this store or live budgets will be forgotten early.
    pub fn sweep(&self, horizon: Duration) -> SweepStats {
        let now = self.clock.now_millis();
        let horizon_ms = duration_millis(horizon);
        let mut logs = self.lock();
        let mut stats = SweepStats::default();

        logs.retain(|_, log| {
            stats.pruned_entries += prune_older_than(log, now, horizon_ms);
            if log.is_empty() {
                stats.removed_keys += 1;
                false
            } else {
                true
            }
        });
        stats.tracked_keys = logs.len();
        stats
    }

    /// Number of client keys currently holding history.
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    /// Number of timestamps retained for `key` (0 when untracked).
    pub fn entries(&self, key: &str) -> usize {
        self.lock().get(key).map_or(0, VecDeque::len)
    }

    /// Forget every client. Mostly useful for operator resets and tests.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // Nothing inside a critical section can panic half-way through an update,
    // so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, RequestLog>> {
        self.logs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pop entries whose age is `>= window_ms`; returns how many were dropped.
/// Logs are ascending, so pruning stops at the first live entry.
fn prune_older_than(log: &mut RequestLog, now: u64, window_ms: u64) -> usize {
    let mut pruned = 0;
    while let Some(&oldest) = log.front() {
        if now.saturating_sub(oldest) < window_ms {
            break;
        }
        log.pop_front();
        pruned += 1;
    }
    pruned
}

fn remaining(max: usize, used: usize) -> u32 {
    u32::try_from(max.saturating_sub(used)).unwrap_or(u32::MAX)
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
