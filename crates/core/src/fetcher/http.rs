//! HTTP fetcher implementation with bounded retry.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::HttpConfig;

use super::types::{FetchError, Fetcher};

/// Browser-like user agent; the source rejects obvious bots.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Retry behavior for one fetcher.
///
/// Rate limiting and generic transient failures escalate linearly from
/// distinct bases: the source asking us to slow down warrants a longer pause
/// than a flaky connection.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_base: Duration,
    pub transient_base: Duration,
}

impl RetryPolicy {
    /// Backoff before retrying after a rate-limit signal on `attempt` (1-based).
    pub fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        self.rate_limit_base * attempt
    }

    /// Backoff before retrying after a transport failure on `attempt` (1-based).
    pub fn transient_backoff(&self, attempt: u32) -> Duration {
        self.transient_base * attempt
    }
}

impl From<&HttpConfig> for RetryPolicy {
    fn from(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            rate_limit_base: Duration::from_millis(config.rate_limit_backoff_ms),
            transient_base: Duration::from_millis(config.transient_backoff_ms),
        }
    }
}

/// Reqwest-backed fetcher.
pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl HttpFetcher {
    /// Create a fetcher with the given configuration.
    ///
    /// The client is built once; every request inherits the configured
    /// timeout and user agent.
    pub fn new(config: &HttpConfig, cancel: CancellationToken) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            policy: RetryPolicy::from(config),
            cancel,
        }
    }

    /// One request, classified for the retry loop.
    async fn attempt(&self, url: &str) -> AttemptOutcome {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    match response.text().await {
                        Ok(body) => AttemptOutcome::Success(body),
                        Err(e) => AttemptOutcome::Transient(e.to_string()),
                    }
                } else if status == StatusCode::TOO_MANY_REQUESTS {
                    AttemptOutcome::RateLimited
                } else {
                    AttemptOutcome::Fatal(FetchError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    })
                }
            }
            Err(e) => AttemptOutcome::Transient(e.to_string()),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        run_attempts(&self.policy, &self.cancel, url, || self.attempt(url)).await
    }
}

/// Outcome of a single request attempt.
pub(crate) enum AttemptOutcome {
    Success(String),
    RateLimited,
    Transient(String),
    Fatal(FetchError),
}

/// Bounded-attempt loop with computed backoff.
///
/// Attempts are numbered from 1. Fatal outcomes return immediately;
/// retryable ones sleep `base * attempt` (a cancellable suspension) and try
/// again until the budget is spent.
pub(crate) async fn run_attempts<F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    url: &str,
    mut attempt: F,
) -> Result<String, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AttemptOutcome>,
{
    let mut last_error = String::new();

    for n in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        match attempt().await {
            AttemptOutcome::Success(body) => return Ok(body),
            AttemptOutcome::Fatal(e) => {
                warn!(url = url, error = %e, "request rejected");
                return Err(e);
            }
            AttemptOutcome::RateLimited => {
                last_error = "rate limited".to_string();
                if n < policy.max_attempts {
                    let delay = policy.rate_limit_backoff(n);
                    debug!(
                        url = url,
                        attempt = n,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    sleep_or_cancel(cancel, delay).await?;
                }
            }
            AttemptOutcome::Transient(e) => {
                warn!(url = url, attempt = n, error = %e, "request failed");
                last_error = e;
                if n < policy.max_attempts {
                    sleep_or_cancel(cancel, policy.transient_backoff(n)).await?;
                }
            }
        }
    }

    Err(FetchError::RetriesExhausted {
        url: url.to_string(),
        attempts: policy.max_attempts,
        last_error,
    })
}

async fn sleep_or_cancel(cancel: &CancellationToken, delay: Duration) -> Result<(), FetchError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    fn test_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            rate_limit_base: Duration::from_millis(20),
            transient_base: Duration::from_millis(10),
        }
    }

    #[test]
    fn backoff_escalates_linearly_per_attempt() {
        let policy = test_policy();
        assert_eq!(policy.rate_limit_backoff(1), Duration::from_millis(20));
        assert_eq!(policy.rate_limit_backoff(2), Duration::from_millis(40));
        assert_eq!(policy.rate_limit_backoff(3), Duration::from_millis(60));
        assert!(policy.transient_backoff(1) < policy.transient_backoff(2));
        assert!(policy.transient_backoff(2) < policy.transient_backoff(3));
    }

    #[tokio::test]
    async fn rate_limited_twice_then_success_returns_body() {
        let policy = test_policy();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let times: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let result = run_attempts(&policy, &cancel, "http://test/search", || {
            let calls = Arc::clone(&calls);
            let times = Arc::clone(&times);
            async move {
                times.lock().unwrap().push(Instant::now());
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => AttemptOutcome::RateLimited,
                    _ => AttemptOutcome::Success("ok".to_string()),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Backoff between attempts grows strictly
        let times = times.lock().unwrap();
        let first_gap = times[1] - times[0];
        let second_gap = times[2] - times[1];
        assert!(second_gap > first_gap, "{second_gap:?} <= {first_gap:?}");
    }

    #[tokio::test]
    async fn fatal_status_fails_after_exactly_one_attempt() {
        let policy = test_policy();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let result = run_attempts(&policy, &cancel, "http://test/missing", || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                AttemptOutcome::Fatal(FetchError::Status {
                    status: 404,
                    url: "http://test/missing".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_exhaust_the_attempt_budget() {
        let policy = test_policy();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let result = run_attempts(&policy, &cancel, "http://test/flaky", || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                AttemptOutcome::Transient("connection reset".to_string())
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(FetchError::RetriesExhausted {
                attempts,
                last_error,
                ..
            }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "connection reset");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_before_any_attempt() {
        let policy = test_policy();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = run_attempts(&policy, &cancel, "http://test", || async {
            AttemptOutcome::Success("never".to_string())
        })
        .await;

        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_aborts_a_backoff_sleep() {
        let policy = RetryPolicy {
            max_attempts: 3,
            rate_limit_base: Duration::from_secs(60),
            transient_base: Duration::from_secs(60),
        };
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result = run_attempts(&policy, &cancel, "http://test", || async {
            AttemptOutcome::RateLimited
        })
        .await;

        assert!(matches!(result, Err(FetchError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
