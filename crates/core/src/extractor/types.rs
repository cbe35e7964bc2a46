//! Types for payload extraction.

use thiserror::Error;

/// Partial package record pulled from one search-results page.
///
/// Every field defaults to its zero value when the payload does not carry it;
/// extraction never fails over a missing field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHit {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub license: String,
    pub downloads_weekly: u64,
    pub downloads_monthly: u64,
    pub dependents: u64,
    pub last_publish: String,
    pub homepage: String,
    pub repository: String,
    pub keywords: Vec<String>,
    pub quality_score: f64,
    pub popularity_score: f64,
    pub maintenance_score: f64,
}

/// Partial record pulled from one package detail page.
///
/// The two markers are scanned independently; either, both, or neither may be
/// present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailFields {
    /// Unpacked tarball size in bytes.
    pub unpacked_size: Option<u64>,
    /// Number of files in the tarball.
    pub file_count: Option<u64>,
}

/// Errors that can occur during extraction.
///
/// An absent data block is not an error (pages legitimately carry no
/// results); only a block that is present but unreadable is reported.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("state block present but not parseable: {0}")]
    MalformedStateBlock(String),
}

/// Trait for payload extraction strategies.
///
/// Implementations are pure text-to-record functions with no I/O, safe to
/// share across workers.
pub trait Extractor: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &'static str;

    /// Extract the search-result partials embedded in a search page payload.
    ///
    /// Returns an empty vec when the page carries no result data.
    fn search_hits(&self, payload: &str) -> Result<Vec<SearchHit>, ExtractError>;

    /// Extract the size/file-count markers from a package detail payload.
    fn detail_fields(&self, payload: &str) -> Result<DetailFields, ExtractError>;
}
