//! Payload extraction.
//!
//! This module provides an `Extractor` trait for turning raw page payloads
//! into partial package records, with two strategies: the structured
//! state-blob parser and a best-effort per-field scanner. Orchestration code
//! never depends on which strategy is wired in.

mod field_scan;
mod state_block;
mod types;

pub use field_scan::FieldScanExtractor;
pub use state_block::StateBlockExtractor;
pub use types::*;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::config::ExtractorBackend;

/// Create the configured extraction strategy.
pub fn create_extractor(backend: ExtractorBackend) -> Arc<dyn Extractor> {
    match backend {
        ExtractorBackend::StateBlock => Arc::new(StateBlockExtractor::new()),
        ExtractorBackend::FieldScan => Arc::new(FieldScanExtractor::new()),
    }
}

static UNPACKED_SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""unpackedSize"\s*:\s*(\d+)"#).expect("unpackedSize pattern"));
static FILE_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""fileCount"\s*:\s*(\d+)"#).expect("fileCount pattern"));

/// Scan a detail payload for the size and file-count markers.
///
/// The two patterns are matched independently anywhere in the payload; both
/// strategies share this since the markers sit outside the state blob.
pub(crate) fn scan_detail_markers(payload: &str) -> DetailFields {
    DetailFields {
        unpacked_size: scan_u64(&UNPACKED_SIZE_RE, payload),
        file_count: scan_u64(&FILE_COUNT_RE, payload),
    }
}

fn scan_u64(re: &Regex, payload: &str) -> Option<u64> {
    re.captures(payload)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
