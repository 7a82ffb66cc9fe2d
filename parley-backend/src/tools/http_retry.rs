//! HTTP retry helpers
//!
//! Classifies transient HTTP failures (timeouts, connection errors, 408, 429,
//! gateway errors) and computes exponential backoff between attempts. Only the
//! LLM client retries; tools report failures back to the model instead.

use std::time::Duration;

/// Delay before the first retry
const BASE_BACKOFF_MS: u64 = 500;
/// Upper bound for a single backoff
const MAX_BACKOFF_MS: u64 = 8_000;

/// Backoff before retry number `attempt` (1-based), doubling and capped
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let ms = BASE_BACKOFF_MS.saturating_mul(1u64 << exp).min(MAX_BACKOFF_MS);
    Duration::from_millis(ms)
}

/// Check if an error message describes a retryable failure
pub fn is_retryable_error(error: &str) -> bool {
    let error_lower = error.to_lowercase();

    // Network/connection errors
    if error_lower.contains("timeout")
        || error_lower.contains("timed out")
        || error_lower.contains("connection")
        || error_lower.contains("network")
        || error_lower.contains("dns")
    {
        return true;
    }

    // Gateway errors and rate limiting
    error_lower.contains("502")
        || error_lower.contains("bad gateway")
        || error_lower.contains("503")
        || error_lower.contains("service unavailable")
        || error_lower.contains("504")
        || error_lower.contains("gateway timeout")
        || error_lower.contains("429")
        || error_lower.contains("too many requests")
        || error_lower.contains("rate limit")
}

/// Check if an HTTP status code indicates a retryable error
pub fn is_retryable_status(status: u16) -> bool {
    matches!(
        status,
        408 | // Request Timeout
        429 | // Too Many Requests
        500 | // Internal Server Error (sometimes transient)
        502 | // Bad Gateway
        503 | // Service Unavailable
        504   // Gateway Timeout
    )
}

/// Helper function to check if a reqwest error is retryable
pub fn is_reqwest_error_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout()
        || err.is_connect()
        || err.is_request()
        || err.status().map(|s| is_retryable_status(s.as_u16())).unwrap_or(false)
}
