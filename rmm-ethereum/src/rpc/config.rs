use std::time::Duration;

/// Configuration for RPC provider retry behavior
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RPCRetryConfig {
    /// Maximum number of retry attempts for failed requests (default: 3)
    pub max_retries: usize,
    /// Initial backoff delay in milliseconds (default: 100ms)
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds (default: 5000ms)
    pub max_backoff_ms: u64,
}

impl RPCRetryConfig {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self { max_retries, initial_backoff_ms, max_backoff_ms }
    }
}

impl Default for RPCRetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, initial_backoff_ms: 100, max_backoff_ms: 5000 }
    }
}

/// How the receipt wait primitive polls the node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptPollingConfig {
    /// Delay between two receipt lookups (default: 4s)
    pub interval: Duration,
    /// Give up waiting after this long. `None` waits forever (default: 5 minutes)
    pub timeout: Option<Duration>,
}

impl ReceiptPollingConfig {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }
}

impl Default for ReceiptPollingConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(4), timeout: Some(Duration::from_secs(300)) }
    }
}
