//! Background sweep task.
//!
//! Admission checks only prune the caller's own log, so a client that stops
//! sending requests would otherwise keep its history forever. The sweeper walks
//! every limiter in a [`LimiterRegistry`] on a fixed interval and drops history
//! older than the registry's retention horizon.

use crate::rate_limit::registry::LimiterRegistry;
use crate::telemetry::{emit_best_effort, NullSink, TelemetrySink};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Spawns sweep tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sweeper;

impl Sweeper {
    /// Start sweeping `registry` at its configured interval, without telemetry.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(registry: LimiterRegistry) -> SweeperHandle {
        let interval = registry.sweep_interval();
        Self::spawn_with(registry, interval, NullSink)
    }

    /// Start sweeping `registry` every `every`, emitting one
    /// [`PolicyEvent::Sweep`](crate::telemetry::PolicyEvent::Sweep) per limiter per pass into `sink`.
    ///
    /// The first pass runs one full interval after start. A zero `every` is
    /// bumped to one millisecond.
    pub fn spawn_with<T>(registry: LimiterRegistry, every: Duration, sink: T) -> SweeperHandle
    where
        T: TelemetrySink,
        T::Future: Send + 'static,
    {
        let every = every.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(
                interval_ms = u64::try_from(every.as_millis()).unwrap_or(u64::MAX),
                retention_secs = registry.retention().as_secs(),
                "rate limit sweeper started"
            );

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        for event in registry.sweep_events() {
                            emit_best_effort(sink.clone(), event).await;
                        }
                    }
                }
            }

            tracing::info!("rate limit sweeper stopped");
        });

        SweeperHandle { shutdown: Some(shutdown_tx), join: Some(join) }
    }
}

/// Owns a running sweep task. Dropping the handle aborts the task.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Signal the task to stop and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                if err.is_panic() {
                    tracing::warn!(error = %err, "rate limit sweeper panicked");
                }
            }
        }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}
