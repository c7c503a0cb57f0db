//! NumCalc Server: numeric and statistical calculations over HTTP.
//!
//! Lets callers that cannot run numeric code themselves (notably LLM-driven
//! agents) request a calculation by name from a fixed allow-list.
//!
//! # Endpoints
//!
//! - `POST /calculate`: `{service, calculation, data, params?}` → `{result}`
//! - `GET  /calculations`: allowed calculations per service with their input shape
//! - `GET  /health`: server status, version, counters
//! - `GET  /`: welcome message

mod limits;
mod rate_limit;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::{Router, middleware};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use limits::Limits;
use state::{AppState, SharedState};

/// NumCalc calculation server for numpy/scipy-style calculations over HTTP.
#[derive(Parser, Debug)]
#[command(name = "numcalc-server", version = nc_core::VERSION, about)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Bind address.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Wall-clock limit for a single calculation, in seconds.
    #[arg(long, default_value = "5")]
    timeout_secs: u64,

    /// Maximum number of calculations running at the same time.
    #[arg(long, default_value = "32")]
    max_concurrent: usize,

    /// Per-request working-memory ceiling in MiB.
    #[arg(long, default_value = "500")]
    memory_limit_mb: usize,

    /// Requests allowed per client IP per window (0 = unlimited).
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Rate-limit window length in seconds.
    #[arg(long, default_value = "60")]
    rate_window_secs: u64,

    /// Maximum request body size in MiB.
    #[arg(long, default_value = "16")]
    max_body_mb: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();
    if cli.max_concurrent == 0 {
        anyhow::bail!("--max-concurrent must be at least 1");
    }

    let limits = Limits {
        timeout: Duration::from_secs(cli.timeout_secs),
        max_concurrent: cli.max_concurrent,
        memory_limit_bytes: mb_to_bytes(cli.memory_limit_mb),
        rate_limit: cli.rate_limit,
        rate_window: Duration::from_secs(cli.rate_window_secs),
    };
    let state = Arc::new(AppState::new(limits));

    let app = app(state, mb_to_bytes(cli.max_body_mb));

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    tracing::info!(
        %addr,
        version = nc_core::VERSION,
        timeout_s = cli.timeout_secs,
        max_concurrent = cli.max_concurrent,
        memory_limit_mb = cli.memory_limit_mb,
        rate_limit = cli.rate_limit,
        rate_window_s = cli.rate_window_secs,
        "numcalc-server starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

/// Full application: rate-limited routes, then `/health`, under body limit,
/// tracing and CORS.
fn app(state: SharedState, max_body_bytes: usize) -> Router {
    routes::router()
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::enforce))
        .merge(routes::health_router())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn mb_to_bytes(mb: usize) -> usize {
    mb.saturating_mul(1024).saturating_mul(1024)
}
