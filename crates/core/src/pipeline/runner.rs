//! Scrape runner implementation.
//!
//! Drives a run through its phases:
//! - Discovery: sequential paginated search until an empty page or the page
//!   limit, so discovery order is fully determined before any worker starts
//! - Enrichment: a fixed-size pool of workers, each walking its own
//!   contiguous slice of the task set
//! - Aggregation: discovery order restored, then the configured sort applied

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::aggregate::sort_packages;
use crate::config::Config;
use crate::extractor::{DetailFields, Extractor};
use crate::fetcher::{FetchError, Fetcher};
use crate::model::Package;

use super::types::{EnrichTask, RunOutcome, RunSummary};

/// Shared, lock-protected result store filled by the workers.
type ResultStore = Arc<Mutex<Vec<(usize, Package)>>>;

/// The scrape runner - one instance per run, holding the run's immutable
/// configuration and collaborators.
pub struct ScrapeRunner {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    cancel: CancellationToken,
}

impl ScrapeRunner {
    /// Create a runner with its own cancellation token.
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            config,
            fetcher,
            extractor,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token (shared with the fetcher
    /// and the caller's signal handler).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this run when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the full run.
    ///
    /// Individual page and task failures are logged and absorbed; the run
    /// itself always completes with an outcome, stopping early only on the
    /// cancellation signal.
    pub async fn run(&self) -> RunOutcome {
        let started = Instant::now();
        info!(
            query = %self.config.scrape.query,
            workers = self.config.scrape.workers,
            max_pages = self.config.scrape.max_pages,
            "starting scrape run"
        );

        let (tasks, pages_scraped) = self.discover().await;
        let discovered = tasks.len();
        info!(
            discovered = discovered,
            pages = pages_scraped,
            "discovery complete"
        );

        let (mut entries, detail_failures) = self.enrich(tasks).await;
        let enriched = entries.len();

        // Restore discovery order before the keyed sort: completion
        // interleaving across workers must not leak into the output.
        entries.sort_by_key(|(index, _)| *index);
        let mut packages: Vec<Package> = entries.into_iter().map(|(_, pkg)| pkg).collect();
        sort_packages(&mut packages, self.config.scrape.sort);

        let summary = RunSummary {
            pages_scraped,
            discovered,
            enriched,
            abandoned: discovered - enriched,
            detail_failures,
            cancelled: self.cancel.is_cancelled(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            enriched = summary.enriched,
            abandoned = summary.abandoned,
            sort = %self.config.scrape.sort,
            duration_ms = summary.duration_ms,
            "run complete"
        );

        RunOutcome { packages, summary }
    }

    fn search_url(&self, page: u32) -> String {
        format!(
            "{}/search?q={}&page={}",
            self.config.http.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.scrape.query),
            page
        )
    }

    /// Walk the paginated search until an empty page or the page limit.
    async fn discover(&self) -> (Vec<EnrichTask>, u32) {
        let page_delay = Duration::from_millis(self.config.scrape.page_delay_ms);
        let mut hits = Vec::new();
        let mut pages_scraped = 0u32;

        for page in 1..=self.config.scrape.max_pages {
            if self.cancel.is_cancelled() {
                break;
            }

            let url = self.search_url(page);
            debug!(page = page, url = %url, "fetching search page");

            let page_hits = match self.fetcher.fetch(&url).await {
                Ok(payload) => match self.extractor.search_hits(&payload) {
                    Ok(page_hits) => page_hits,
                    Err(e) => {
                        warn!(page = page, error = %e, "search page unreadable, skipping");
                        Vec::new()
                    }
                },
                Err(FetchError::Cancelled) => break,
                Err(e) => {
                    warn!(page = page, error = %e, "search page fetch failed");
                    Vec::new()
                }
            };
            pages_scraped += 1;

            if page_hits.is_empty() {
                info!(page = page, "no results on page, stopping discovery");
                break;
            }

            debug!(page = page, results = page_hits.len(), "search page complete");
            hits.extend(page_hits);

            if page < self.config.scrape.max_pages {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(page_delay) => {}
                }
            }
        }

        let tasks = hits
            .into_iter()
            .filter(|hit| !hit.name.is_empty())
            .enumerate()
            .map(|(index, hit)| EnrichTask { index, hit })
            .collect();
        (tasks, pages_scraped)
    }

    /// Split tasks into `workers` contiguous groups.
    ///
    /// The first `workers - 1` groups hold `n / workers` tasks each; the
    /// last group holds the remainder as well. Valid for any task count and
    /// any worker count >= 1, with empty groups when there are fewer tasks
    /// than workers.
    fn partition(tasks: Vec<EnrichTask>, workers: usize) -> Vec<Vec<EnrichTask>> {
        let workers = workers.max(1);
        let base = tasks.len() / workers;
        let mut iter = tasks.into_iter();

        (0..workers)
            .map(|w| {
                let take = if w == workers - 1 { usize::MAX } else { base };
                iter.by_ref().take(take).collect()
            })
            .collect()
    }

    /// Fan tasks out to the worker pool and collect the store once every
    /// worker has finished.
    async fn enrich(&self, tasks: Vec<EnrichTask>) -> (Vec<(usize, Package)>, usize) {
        let store: ResultStore = Arc::new(Mutex::new(Vec::new()));
        let detail_failures = Arc::new(AtomicUsize::new(0));
        let task_delay = Duration::from_millis(self.config.scrape.task_delay_ms);

        let groups = Self::partition(tasks, self.config.scrape.workers);
        let handles: Vec<_> = groups
            .into_iter()
            .enumerate()
            .map(|(worker_id, group)| {
                let fetcher = Arc::clone(&self.fetcher);
                let extractor = Arc::clone(&self.extractor);
                let store = Arc::clone(&store);
                let detail_failures = Arc::clone(&detail_failures);
                let cancel = self.cancel.clone();
                let base_url = self.config.http.base_url.clone();

                tokio::spawn(async move {
                    run_worker(
                        worker_id,
                        group,
                        fetcher,
                        extractor,
                        store,
                        detail_failures,
                        cancel,
                        base_url,
                        task_delay,
                    )
                    .await
                })
            })
            .collect();

        for (worker_id, result) in join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = result {
                error!(
                    worker = worker_id,
                    error = %e,
                    "worker died, its remaining tasks are abandoned"
                );
            }
        }

        // All workers have joined; nothing mutates the store past this point.
        let entries = Arc::try_unwrap(store)
            .map(|m| m.into_inner())
            .unwrap_or_default();
        (entries, detail_failures.load(Ordering::Relaxed))
    }
}

/// One enrichment worker: walks its group strictly sequentially.
#[allow(clippy::too_many_arguments)]
async fn run_worker(
    worker_id: usize,
    group: Vec<EnrichTask>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    store: ResultStore,
    detail_failures: Arc<AtomicUsize>,
    cancel: CancellationToken,
    base_url: String,
    task_delay: Duration,
) {
    for task in group {
        if cancel.is_cancelled() {
            debug!(worker = worker_id, "cancelled, abandoning remaining tasks");
            break;
        }

        let url = format!(
            "{}/package/{}",
            base_url.trim_end_matches('/'),
            task.hit.name
        );

        // A failed detail lookup degrades the record instead of dropping it;
        // the search-side fields still make a valid entity.
        let detail = match fetcher.fetch(&url).await {
            Ok(payload) => match extractor.detail_fields(&payload) {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(
                        worker = worker_id,
                        package = %task.hit.name,
                        error = %e,
                        "detail payload unreadable, keeping search fields"
                    );
                    detail_failures.fetch_add(1, Ordering::Relaxed);
                    DetailFields::default()
                }
            },
            Err(FetchError::Cancelled) => break,
            Err(e) => {
                warn!(
                    worker = worker_id,
                    package = %task.hit.name,
                    error = %e,
                    "detail fetch failed, keeping search fields"
                );
                detail_failures.fetch_add(1, Ordering::Relaxed);
                DetailFields::default()
            }
        };

        let index = task.index;
        let package = Package::from_parts(task.hit, detail);
        debug!(worker = worker_id, package = %package.name, "enriched");
        store.lock().await.push((index, package));

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(task_delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::SearchHit;

    fn tasks(n: usize) -> Vec<EnrichTask> {
        (0..n)
            .map(|index| EnrichTask {
                index,
                hit: SearchHit {
                    name: format!("pkg-{index}"),
                    ..SearchHit::default()
                },
            })
            .collect()
    }

    fn flatten(groups: &[Vec<EnrichTask>]) -> Vec<usize> {
        groups
            .iter()
            .flat_map(|g| g.iter().map(|t| t.index))
            .collect()
    }

    #[test]
    fn partition_covers_every_task_exactly_once() {
        for n in [0usize, 1, 3, 7, 10, 23] {
            for w in [1usize, 2, 3, 10, 40] {
                let groups = ScrapeRunner::partition(tasks(n), w);
                assert_eq!(groups.len(), w, "n={n} w={w}");
                assert_eq!(flatten(&groups), (0..n).collect::<Vec<_>>(), "n={n} w={w}");
            }
        }
    }

    #[test]
    fn partition_puts_remainder_on_last_group() {
        let groups = ScrapeRunner::partition(tasks(10), 3);
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 4]);
    }

    #[test]
    fn partition_fewer_tasks_than_workers() {
        let groups = ScrapeRunner::partition(tasks(2), 5);
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        // base is 0: everything lands on the last group, others stay empty
        assert_eq!(sizes, vec![0, 0, 0, 0, 2]);
        assert_eq!(flatten(&groups), vec![0, 1]);
    }

    #[test]
    fn partition_groups_are_contiguous() {
        let groups = ScrapeRunner::partition(tasks(9), 4);
        for group in &groups {
            let indices: Vec<usize> = group.iter().map(|t| t.index).collect();
            for pair in indices.windows(2) {
                assert_eq!(pair[1], pair[0] + 1);
            }
        }
    }

    #[test]
    fn url_building_encodes_the_query() {
        let mut config = Config::default();
        config.scrape.query = "state machine".to_string();
        let runner = ScrapeRunner::new(
            config,
            Arc::new(crate::testing::MockFetcher::new()),
            Arc::new(crate::extractor::StateBlockExtractor::new()),
        );
        let url = runner.search_url(2);
        assert_eq!(
            url,
            "https://www.npmjs.com/search?q=state%20machine&page=2"
        );
    }
}
