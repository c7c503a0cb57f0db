//! Resource ceilings for calculations.
//!
//! Every calculation runs on the blocking pool under three limits:
//!
//! - a working-memory estimate checked before the task is spawned,
//! - a concurrency ceiling (semaphore permit held by the task),
//! - a wall-clock timeout on the caller side.
//!
//! A calculation that times out keeps running on its blocking thread until it
//! finishes; its result is dropped and its permit released then.
//!
//! The per-client request budget lives here too; it is enforced by
//! [`crate::rate_limit`] before a request reaches a handler.

use std::time::Duration;

use nc_core::{Error, Payload};

use crate::state::AppState;

/// Bytes of working memory assumed per input number: the input copy, sorted and
/// ranked copies made by the rank tests, and the output.
const BYTES_PER_ELEMENT: usize = 8 * 16;

/// Configured ceilings.
#[derive(Debug, Clone)]
pub struct Limits {
    pub timeout: Duration,
    pub max_concurrent: usize,
    pub memory_limit_bytes: usize,
    /// Requests per client per `rate_window`; 0 disables the budget.
    pub rate_limit: u32,
    pub rate_window: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_concurrent: 32,
            memory_limit_bytes: 500 << 20,
            rate_limit: 10,
            rate_window: Duration::from_secs(60),
        }
    }
}

impl Limits {
    /// Reject payloads whose estimated working set exceeds the memory limit.
    pub fn check_memory(&self, payload: &Payload) -> Result<(), Error> {
        let estimate = payload.element_count().saturating_mul(BYTES_PER_ELEMENT);
        if estimate > self.memory_limit_bytes {
            return Err(Error::Resource(format!(
                "estimated working memory of {} MiB exceeds the limit of {} MiB",
                estimate.div_ceil(1 << 20),
                self.memory_limit_bytes >> 20
            )));
        }
        Ok(())
    }
}

/// Run `f` on the blocking pool under the concurrency ceiling and timeout.
pub async fn run_guarded<T, F>(state: &AppState, f: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    let permit = state.permits.clone().try_acquire_owned().map_err(|_| {
        Error::Resource(format!(
            "server busy: {} calculations already running",
            state.limits.max_concurrent
        ))
    })?;

    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        f()
    });

    match tokio::time::timeout(state.limits.timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(Error::Internal(format!("calculation task failed: {e}"))),
        Err(_) => Err(Error::Timeout { seconds: state.limits.timeout.as_secs() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(timeout_ms: u64, max_concurrent: usize) -> AppState {
        AppState::new(Limits {
            timeout: Duration::from_millis(timeout_ms),
            max_concurrent,
            memory_limit_bytes: 1 << 20,
            ..Limits::default()
        })
    }

    #[test]
    fn memory_estimate() {
        let limits = state(1000, 1).limits;
        assert!(limits.check_memory(&Payload::Flat(vec![0.0; 8192])).is_ok());
        let err = limits.check_memory(&Payload::Flat(vec![0.0; 8193])).unwrap_err();
        assert_eq!(err.kind(), "ResourceError");
    }

    #[tokio::test]
    async fn completes_within_limits() {
        let st = state(1000, 2);
        assert_eq!(run_guarded(&st, || Ok(42)).await.unwrap(), 42);
        assert_eq!(st.permits.available_permits(), 2);
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let st = state(20, 1);
        let err = run_guarded(&st, || {
            std::thread::sleep(Duration::from_millis(300));
            Ok(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "TimeoutError");
        // the timed-out task still holds its permit
        let busy = run_guarded(&st, || Ok(())).await.unwrap_err();
        assert_eq!(busy.kind(), "ResourceError");
    }

    #[tokio::test]
    async fn panic_becomes_internal() {
        let st = state(1000, 1);
        let err = run_guarded::<(), _>(&st, || panic!("boom")).await.unwrap_err();
        assert_eq!(err.kind(), "InternalError");
    }
}
