//! Retry policy for asset registration.
//!
//! Extracted from the dispatcher so attempt counting, the backoff curve,
//! and the retryable-outcome predicate are testable without network I/O.

use reqwest::StatusCode;
use std::time::Duration;

/// How the dispatcher treats a busy single-writer backend: a handful of
/// attempts with exponentially growing pauses.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: 5,
            base_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// The pause after failed attempt `attempt` (1-indexed): the base
    /// delay doubled once per preceding attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Whether a rejection is transient contention worth another attempt.
    ///
    /// 409/429/503 and any body mentioning a lock point at a busy
    /// single-writer store rather than a bad request.
    pub fn is_retryable(&self, status: StatusCode, body: &str) -> bool {
        matches!(status.as_u16(), 409 | 429 | 503) || body.to_lowercase().contains("locked")
    }
}
