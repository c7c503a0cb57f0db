//! Shared application state for the NumCalc server.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::limits::Limits;
use crate::rate_limit::RateLimit;

/// Shared state available to all request handlers.
pub struct AppState {
    /// Server start time (for uptime reporting).
    pub started_at: Instant,

    /// Resource ceilings applied to every calculation.
    pub limits: Limits,

    /// One permit per calculation allowed to run at the same time. A permit is
    /// released when the blocking task finishes, not when the request times out.
    pub permits: Arc<Semaphore>,

    /// Per-client request budget; `None` when unlimited.
    pub rate_limit: Option<RateLimit>,

    /// In-flight request counter (for /health).
    pub inflight: AtomicU64,

    /// Total requests served (for /health).
    pub total_requests: AtomicU64,
}

impl AppState {
    pub fn new(limits: Limits) -> Self {
        Self {
            started_at: Instant::now(),
            permits: Arc::new(Semaphore::new(limits.max_concurrent)),
            rate_limit: RateLimit::new(limits.rate_limit, limits.rate_window),
            limits,
            inflight: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
        }
    }
}

/// Type alias used in axum handlers.
pub type SharedState = Arc<AppState>;
