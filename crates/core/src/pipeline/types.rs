//! Types for the scrape pipeline.

use crate::extractor::SearchHit;
use crate::model::Package;

/// One discovered package awaiting enrichment.
///
/// Owned by exactly one worker for its lifetime. The index records the
/// position in discovery order (pages in fetch order, source order within a
/// page) so the final ordering can be restored after concurrent enrichment.
#[derive(Debug, Clone)]
pub struct EnrichTask {
    pub index: usize,
    pub hit: SearchHit,
}

/// Counters describing a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Search pages actually fetched (zero when max_pages is 0).
    pub pages_scraped: u32,
    /// Tasks produced by discovery.
    pub discovered: usize,
    /// Packages that made it into the result set. Never exceeds
    /// `discovered`; failures shrink the set, nothing fabricates entries.
    pub enriched: usize,
    /// Tasks abandoned by a dead or cancelled worker.
    pub abandoned: usize,
    /// Packages kept with search-side fields only because their detail fetch
    /// or parse failed.
    pub detail_failures: usize,
    /// Whether the cancellation signal was raised during the run.
    pub cancelled: bool,
    pub duration_ms: u64,
}

/// Result of a run: the ordered packages plus counters.
///
/// A run always completes with an outcome; a degraded or empty package list
/// is preferred over aborting.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub packages: Vec<Package>,
    pub summary: RunSummary,
}
