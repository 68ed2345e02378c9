//! Telemetry and observability for limiters.
//!
//! Limiters emit structured events that describe their behavior. Events flow
//! through `TelemetrySink` implementations which can log, aggregate, or forward
//! them to external systems.
//!
//! # Event Types
//!
//! - **Admission** (emitted by the HTTP middleware): `Admitted`, `Rejected`
//! - **Sweep** (emitted by the background sweeper): one per limiter per pass
//!
//! # Telemetry Sinks
//!
//! The `TelemetrySink` trait defines how events are consumed. It's implemented
//! as a `tower::Service<PolicyEvent>` for composability.
//!
//! ```rust
//! use tollgate::telemetry::{AdmissionEvent, PolicyEvent};
//!
//! let event = PolicyEvent::Admission(AdmissionEvent::Admitted {
//!     policy: "api".into(),
//!     limit: 100,
//!     remaining: 99,
//! });
//! assert_eq!(event.kind(), "admitted");
//! ```

pub mod events;
pub mod sinks;

pub use events::{AdmissionEvent, PolicyEvent, SweepEvent};
pub use sinks::{
    emit_best_effort, ComposedSinkError, LogSink, MemorySink, MulticastSink, NullSink,
    TelemetrySink,
};
