//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, Fetcher};

/// One scripted reply for a URL.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Successful fetch with this body.
    Body(String),
    /// Terminal HTTP status.
    Status(u16),
    /// Transient failures that exhausted the retry budget.
    Exhausted,
}

impl ScriptedResponse {
    fn into_result(self, url: &str) -> Result<String, FetchError> {
        match self {
            Self::Body(body) => Ok(body),
            Self::Status(status) => Err(FetchError::Status {
                status,
                url: url.to_string(),
            }),
            Self::Exhausted => Err(FetchError::RetriesExhausted {
                url: url.to_string(),
                attempts: 3,
                last_error: "connection reset".to_string(),
            }),
        }
    }
}

/// Mock implementation of the Fetcher trait.
///
/// Provides controllable behavior for testing:
/// - Script per-URL replies, singly (sticky) or as a consumed sequence
/// - Track fetched URLs for assertions
/// - Unscripted URLs answer with HTTP 404
///
/// # Example
///
/// ```rust,ignore
/// use pakrat_core::testing::{fixtures, MockFetcher};
///
/// let fetcher = MockFetcher::new();
/// fetcher.script("https://host/search?q=x&page=1", fixtures::empty_search_page()).await;
///
/// let body = fetcher.fetch("https://host/search?q=x&page=1").await?;
/// assert_eq!(fetcher.fetch_count().await, 1);
/// ```
#[derive(Default)]
pub struct MockFetcher {
    /// Scripted replies per URL; the last entry is sticky.
    responses: Arc<RwLock<HashMap<String, VecDeque<ScriptedResponse>>>>,
    /// Recorded fetch URLs, in call order.
    fetches: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create a mock fetcher with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful body for a URL (sticky once it is the last entry).
    pub async fn script(&self, url: &str, body: String) {
        self.push(url, ScriptedResponse::Body(body)).await;
    }

    /// Script a failing reply for a URL.
    pub async fn script_failure(&self, url: &str, response: ScriptedResponse) {
        self.push(url, response).await;
    }

    async fn push(&self, url: &str, response: ScriptedResponse) {
        self.responses
            .write()
            .await
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// URLs fetched so far, in call order.
    pub async fn recorded_fetches(&self) -> Vec<String> {
        self.fetches.read().await.clone()
    }

    /// Number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// Fetches whose URL contains the given fragment.
    pub async fn fetches_matching(&self, fragment: &str) -> Vec<String> {
        self.fetches
            .read()
            .await
            .iter()
            .filter(|url| url.contains(fragment))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetches.write().await.push(url.to_string());

        let mut responses = self.responses.write().await;
        match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .expect("non-empty queue")
                .into_result(url),
            Some(queue) => match queue.front() {
                Some(response) => response.clone().into_result(url),
                None => Err(FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                }),
            },
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}
