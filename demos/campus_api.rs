//! A small campus API with per-route rate limits.
//!
//! ```text
//! cargo run --example campus_api -- --port 3000
//! for i in $(seq 1 12); do curl -s -o /dev/null -w "%{http_code}\n" -X POST localhost:3000/auth/login; done
//! ```
//!
//! Login attempts use the `auth` policy (10/min), reads use `api` (100/min)
//! and the admin backup endpoint uses `strict` (50/min).

use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tollgate::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "campus-api")]
#[command(about = "Demo server protected by tollgate rate limits")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Key clients by X-Forwarded-For / X-Real-IP (only behind a trusted proxy)
    #[arg(long)]
    trust_proxy: bool,

    /// Seconds between background sweeps
    #[arg(long, default_value_t = 60)]
    sweep_interval: u64,
}

async fn login() -> Json<Value> {
    Json(json!({ "token": "demo-session" }))
}

async fn students() -> Json<Value> {
    Json(json!({ "students": [{ "id": 1, "name": "Ada" }, { "id": 2, "name": "Grace" }] }))
}

async fn backup() -> Json<Value> {
    Json(json!({ "status": "backup scheduled" }))
}

fn extractor(trust_proxy: bool) -> PeerIp {
    if trust_proxy {
        PeerIp::behind_proxy()
    } else {
        PeerIp::new()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tollgate=debug")),
        )
        .init();

    let args = Args::parse();
    let config = RateLimitConfig::builder()
        .policy(AUTH, Policy::auth())
        .policy(API, Policy::api())
        .policy(STRICT, Policy::strict())
        .sweep_interval(Duration::from_secs(args.sweep_interval))
        .build()?;
    let limiters = LimiterRegistry::from_config(&config)?;

    let layer = |name: &str| -> Result<_, ConfigError> {
        Ok(RateLimitLayer::new(limiters.require(name)?)
            .key_extractor(extractor(args.trust_proxy))
            .telemetry(LogSink))
    };

    let app = Router::new()
        .merge(Router::new().route("/auth/login", post(login)).layer(layer(AUTH)?))
        .merge(Router::new().route("/api/students", get(students)).layer(layer(API)?))
        .merge(Router::new().route("/admin/backup", post(backup)).layer(layer(STRICT)?));

    let sweeper = Sweeper::spawn_with(limiters.clone(), config.sweep().interval, LogSink);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, trust_proxy = args.trust_proxy, "campus api listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    sweeper.shutdown().await;
    tracing::info!("shut down cleanly");
    Ok(())
}
