use crate::retry::DEFAULT_MAX_429_RETRIES;

/// Configures retry budgets, wait interval and timeout behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Maximum number of HTTP 429 retries per path.
    pub max_429_retries: u32,
    /// Base wait between retries in milliseconds (flat, not exponential).
    pub wait_ms: u64,
    /// Optional per-request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_429_retries: DEFAULT_MAX_429_RETRIES,
            wait_ms: 1_000,
            timeout_ms: None,
        }
    }
}
