//! The package entity produced by a scrape run.

use serde::{Deserialize, Serialize};

use crate::extractor::{DetailFields, SearchHit};

/// A fully assembled npm package record.
///
/// Built by merging a search-page partial with the detail-page fields for the
/// same package. Fields the source never reported stay at their zero value,
/// so a record is always complete and serializable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Package name (never empty for a stored record).
    pub name: String,
    /// Latest published version string.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub license: String,
    /// Unpacked size in bytes (detail page).
    #[serde(default)]
    pub size: u64,
    /// Number of files in the published tarball (detail page).
    #[serde(default)]
    pub files: u64,
    #[serde(default)]
    pub downloads_weekly: u64,
    #[serde(default)]
    pub downloads_monthly: u64,
    #[serde(default)]
    pub dependents: u64,
    /// Last publish date as reported by the source. Kept verbatim; sorting on
    /// it is lexicographic, not calendar-aware.
    #[serde(default)]
    pub last_publish: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub popularity_score: f64,
    #[serde(default)]
    pub maintenance_score: f64,
}

impl Package {
    /// Merge a search-result partial with detail-page fields.
    ///
    /// Detail fields that were not found default to zero; the search partial
    /// already defaults its own missing fields at extraction time.
    pub fn from_parts(hit: SearchHit, detail: DetailFields) -> Self {
        Self {
            name: hit.name,
            version: hit.version,
            description: hit.description,
            author: hit.author,
            license: hit.license,
            size: detail.unpacked_size.unwrap_or(0),
            files: detail.file_count.unwrap_or(0),
            downloads_weekly: hit.downloads_weekly,
            downloads_monthly: hit.downloads_monthly,
            dependents: hit.dependents,
            last_publish: hit.last_publish,
            homepage: hit.homepage,
            repository: hit.repository,
            keywords: hit.keywords,
            quality_score: hit.quality_score,
            popularity_score: hit.popularity_score,
            maintenance_score: hit.maintenance_score,
        }
    }
}
