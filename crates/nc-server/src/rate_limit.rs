//! Per-client request budget.
//!
//! A client (keyed by peer IP) may make at most `rate_limit` requests in any
//! sliding window of `rate_window`. The log of admitted timestamps per client is
//! trimmed on every check; idle clients are dropped once the table grows large.
//! `/health` is mounted outside this layer.

use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use nc_core::Error;

use crate::routes::AppError;
use crate::state::SharedState;

/// Tracked clients above which idle entries are swept.
const SWEEP_THRESHOLD: usize = 4096;

/// Sliding-window request log.
#[derive(Debug)]
pub struct RateLimit {
    max_requests: usize,
    window: Duration,
    admitted: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimit {
    /// `None` when `max_requests` is 0 (unlimited).
    pub fn new(max_requests: u32, window: Duration) -> Option<Self> {
        (max_requests > 0).then(|| Self {
            max_requests: max_requests as usize,
            window: window.max(Duration::from_secs(1)),
            admitted: Mutex::new(HashMap::new()),
        })
    }

    /// Record a request from `client` at `now`, or reject it with a
    /// [`Error::Resource`] naming how long until the oldest request expires.
    pub fn admit(&self, client: IpAddr, now: Instant) -> Result<(), Error> {
        let window = self.window;
        let expired = |t: &Instant| now.saturating_duration_since(*t) >= window;

        let mut admitted = self.admitted.lock().unwrap_or_else(|e| e.into_inner());
        if admitted.len() > SWEEP_THRESHOLD {
            admitted.retain(|_, log| log.back().is_some_and(|t| !expired(t)));
        }

        let log = admitted.entry(client).or_default();
        while log.front().is_some_and(expired) {
            log.pop_front();
        }
        if let Some(oldest) = log.front().filter(|_| log.len() >= self.max_requests) {
            let wait = window.saturating_sub(now.saturating_duration_since(*oldest));
            return Err(Error::Resource(format!(
                "rate limit exceeded: at most {} requests per {} seconds, retry in {} s",
                self.max_requests,
                window.as_secs(),
                wait.as_secs().max(1)
            )));
        }
        log.push_back(now);
        Ok(())
    }
}

/// Middleware applying the state's [`RateLimit`], if any.
pub async fn enforce(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(rate_limit) = &state.rate_limit {
        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| addr.ip());
        if let Err(err) = rate_limit.admit(client, Instant::now()) {
            tracing::debug!(%client, path = request.uri().path(), "rate limited");
            return Err(AppError::from(err));
        }
    }
    Ok(next.run(request).await)
}
