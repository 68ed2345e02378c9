//! Prometheus metrics sink for `tollgate`.
//! Bring your own `prometheus::Registry`; metrics are registered on construction.

use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::sync::Arc;
use std::task::{Context, Poll};
use tollgate::telemetry::{PolicyEvent, TelemetrySink};

/// Counts admission and sweep events per policy, and tracks live client keys.
#[derive(Clone, Debug)]
pub struct PrometheusSink {
    registry: Arc<Registry>,
    events: IntCounterVec,
    tracked_keys: IntGaugeVec,
}

impl PrometheusSink {
    /// Create a sink and register its metrics into the provided registry.
    ///
    /// # Errors
    /// Returns an error if a metric cannot be registered (e.g. name conflict).
    pub fn new<R: Into<Arc<Registry>>>(registry: R) -> Result<Self, prometheus::Error> {
        let registry = registry.into();
        let events = IntCounterVec::new(
            Opts::new("tollgate_events_total", "Rate limiter events"),
            &["policy", "event"],
        )?;
        let tracked_keys = IntGaugeVec::new(
            Opts::new("tollgate_tracked_keys", "Client keys tracked after the last sweep"),
            &["policy"],
        )?;
        registry.register(Box::new(events.clone()))?;
        registry.register(Box::new(tracked_keys.clone()))?;
        tracing::debug!("registered tollgate metrics");
        Ok(Self { registry, events, tracked_keys })
    }

    /// Expose the registry for HTTP scraping.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl tower_service::Service<PolicyEvent> for PrometheusSink {
    type Response = ();
    type Error = Infallible;
    type Future = Ready<Result<(), Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: PolicyEvent) -> Self::Future {
        let policy = event.policy();
        self.events.with_label_values(&[policy, event.kind()]).inc();
        if let PolicyEvent::Sweep(sweep) = &event {
            let tracked = i64::try_from(sweep.tracked_keys).unwrap_or(i64::MAX);
            self.tracked_keys.with_label_values(&[policy]).set(tracked);
        }
        ready(Ok(()))
    }
}

impl TelemetrySink for PrometheusSink {
    type SinkError = Infallible;
}
