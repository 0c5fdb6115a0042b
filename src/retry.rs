//! Per-path retry budgets for HTTP 429 and 503 responses.
//!
//! Budgets are keyed by the relative request path and live as long as the
//! owning client. Nothing ever resets them: once a path has spent its budget,
//! later calls to that path give up on the first retryable response.

use std::{
    cmp,
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Default number of HTTP 429 retries granted per path.
pub const DEFAULT_MAX_429_RETRIES: u32 = 3;

/// Fixed number of HTTP 503 retries granted per path.
pub const SERVICE_UNAVAILABLE_RETRIES: u32 = 10;

/// Response header carrying the rate-limit reset time as Unix seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Retry counters for 429 and 503 responses, tracked independently.
#[derive(Debug, Default)]
pub struct RetryBudgets {
    rate_limited: Mutex<HashMap<String, u32>>,
    unavailable: Mutex<HashMap<String, u32>>,
}

impl RetryBudgets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one 429 retry for `path` if fewer than `max` were used.
    pub fn take_rate_limited(&self, path: &str, max: u32) -> bool {
        take(&self.rate_limited, path, max)
    }

    /// Consumes one 503 retry for `path` if the fixed ceiling is not reached.
    pub fn take_unavailable(&self, path: &str) -> bool {
        take(&self.unavailable, path, SERVICE_UNAVAILABLE_RETRIES)
    }

    /// Number of 429 retries already spent on `path`.
    pub fn rate_limited_count(&self, path: &str) -> u32 {
        count(&self.rate_limited, path)
    }

    /// Number of 503 retries already spent on `path`.
    pub fn unavailable_count(&self, path: &str) -> u32 {
        count(&self.unavailable, path)
    }
}

fn take(counters: &Mutex<HashMap<String, u32>>, path: &str, max: u32) -> bool {
    let mut counters = counters.lock().unwrap_or_else(PoisonError::into_inner);
    let used = counters.entry(path.to_owned()).or_insert(0);
    if *used >= max {
        return false;
    }
    *used += 1;
    true
}

fn count(counters: &Mutex<HashMap<String, u32>>, path: &str) -> u32 {
    counters
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(path)
        .copied()
        .unwrap_or(0)
}

/// Computes the wait before retrying a 503.
///
/// `reset` is the raw `x-ratelimit-reset` value in Unix seconds. When it lies
/// in the future the wait is the larger of `base` and the time left until the
/// reset; a missing, unparsable or past hint falls back to `base`.
pub fn service_unavailable_wait(reset: Option<&str>, base: Duration, now: SystemTime) -> Duration {
    let now_ms = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);

    let reset_ms = reset
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
        .map(|seconds| (seconds * 1000.0) as u128);

    match reset_ms {
        Some(reset_ms) if reset_ms > now_ms => {
            let remaining = u64::try_from(reset_ms - now_ms).unwrap_or(u64::MAX);
            cmp::max(base, Duration::from_millis(remaining))
        }
        _ => base,
    }
}
