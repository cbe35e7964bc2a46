use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::aggregate::SortKey;

/// Root configuration for a scrape run.
///
/// Built once before the pipeline starts and never mutated during execution;
/// independent runs carry independent configs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Extraction strategy to wire in.
    #[serde(default)]
    pub extractor: ExtractorBackend,
}

/// Discovery and enrichment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapeConfig {
    /// Search query.
    #[serde(default)]
    pub query: String,
    /// Maximum search pages to walk; discovery may stop earlier on an empty
    /// page. Zero means scrape nothing.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Output ordering.
    #[serde(default)]
    pub sort: SortKey,
    /// Enrichment worker count.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Pacing delay between successive search pages (milliseconds).
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Pacing delay between a worker's successive detail fetches
    /// (milliseconds).
    #[serde(default = "default_task_delay_ms")]
    pub task_delay_ms: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_pages: default_max_pages(),
            sort: SortKey::default(),
            workers: default_workers(),
            page_delay_ms: default_page_delay_ms(),
            task_delay_ms: default_task_delay_ms(),
        }
    }
}

fn default_max_pages() -> u32 {
    10
}

fn default_workers() -> usize {
    10
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_task_delay_ms() -> u64 {
    500
}

/// Outbound HTTP configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Base URL of the scraped site.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Attempt budget per fetch call (first try included).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff base after a rate-limit signal (milliseconds); escalates
    /// linearly with the attempt number.
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
    /// Backoff base after a transport failure (milliseconds).
    #[serde(default = "default_transient_backoff_ms")]
    pub transient_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            transient_backoff_ms: default_transient_backoff_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.npmjs.com".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_rate_limit_backoff_ms() -> u64 {
    2000
}

fn default_transient_backoff_ms() -> u64 {
    1000
}

/// Artifact output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory the artifact is written into.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Artifact name stem; defaults to `npm-{query}-{sort}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stem: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            stem: None,
        }
    }
}

impl OutputConfig {
    /// Resolve the artifact stem for a run.
    pub fn artifact_stem(&self, query: &str, sort: SortKey) -> String {
        self.stem
            .clone()
            .unwrap_or_else(|| format!("npm-{}-{}", query, sort))
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Available extraction strategies.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorBackend {
    #[default]
    StateBlock,
    FieldScan,
}
