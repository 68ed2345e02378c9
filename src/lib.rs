#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Tollgate
//!
//! Sliding-window rate limiting for async Rust HTTP services.
//!
//! ## Features
//!
//! - **Sliding log** admission per client key: at most `N` admitted requests in any
//!   trailing window, with denied attempts never counted
//! - **Named policies** (`auth`, `api`, `strict`) with fully independent state
//! - **Background sweeper** that reclaims history of clients that went quiet,
//!   stoppable through its handle
//! - **Tower middleware** answering `429 Too Many Requests` with `Retry-After`
//! - **Telemetry** events routed through pluggable `tower::Service` sinks
//!
//! ## Quick Start
//!
//! ```rust
//! use tollgate::{LimiterRegistry, RateLimitLayer, Sweeper};
//! use axum::{routing::{get, post}, Router};
//!
//! #[tokio::main]
//! async fn main() {
//!     let limiters = LimiterRegistry::standard();
//!     let sweeper = Sweeper::spawn(limiters.clone());
//!
//!     let auth = Router::new()
//!         .route("/auth/login", post(|| async { "token" }))
//!         .layer(RateLimitLayer::new(limiters.auth().unwrap()));
//!     let api = Router::new()
//!         .route("/api/students", get(|| async { "[]" }))
//!         .layer(RateLimitLayer::new(limiters.api().unwrap()));
//!     let _app: Router = auth.merge(api);
//!
//!     sweeper.shutdown().await;
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod prelude;
pub mod rate_limit;
pub mod telemetry;

// Re-exports
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{RateLimitConfig, RateLimitConfigBuilder, SweepConfig};
pub use error::{ConfigError, PolicyError};
pub use rate_limit::{
    Decision, HeaderKey, KeyExtractor, LimiterRegistry, PeerIp, Policy, PolicyLimiter,
    RateLimitLayer, RateLimitService, RateLimiter, SlidingWindowStore, SweepStats, Sweeper,
    SweeperHandle,
};
