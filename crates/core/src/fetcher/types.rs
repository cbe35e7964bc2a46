//! Types for outbound page fetching.

use async_trait::async_trait;
use thiserror::Error;

/// Terminal outcomes of a fetch call.
///
/// Transient failures (timeouts, connection errors, rate limiting) are
/// retried inside the fetcher and only surface here once retries are
/// exhausted.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-success, non-rate-limit status. Signals a missing or rejected
    /// resource, not transient overload; never retried.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Retryable failures kept recurring until the attempt budget ran out.
    #[error("giving up on {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    /// The run's cancellation signal was raised while fetching or backing off.
    #[error("fetch cancelled")]
    Cancelled,
}

/// Trait for outbound fetching backends.
///
/// Implementations hold no per-call state and are safe to invoke
/// concurrently from every worker.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a URL and return the response body.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
