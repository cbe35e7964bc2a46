//! Fallback extraction strategy: per-field scanning.
//!
//! Used when the page's state blob cannot be relied on (absent or reshaped).
//! Scans the raw payload for package-shaped field clusters instead of parsing
//! one structured block. Strictly best-effort: string fields only, numeric
//! search fields stay at their defaults.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{DetailFields, ExtractError, Extractor, SearchHit};

/// How far past a name match the sibling fields are looked for.
const FIELD_WINDOW: usize = 2048;

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""name"\s*:\s*"((?:@[A-Za-z0-9_.-]+/)?[A-Za-z0-9_.-]+)""#)
        .expect("name pattern")
});
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""version"\s*:\s*"([^"]*)""#).expect("version pattern"));
static DESCRIPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""description"\s*:\s*"([^"]*)""#).expect("description pattern"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""date"\s*:\s*"([^"]*)""#).expect("date pattern"));

/// Field-scanning extraction strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldScanExtractor;

impl FieldScanExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for FieldScanExtractor {
    fn name(&self) -> &'static str {
        "field_scan"
    }

    fn search_hits(&self, payload: &str) -> Result<Vec<SearchHit>, ExtractError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut hits = Vec::new();

        for caps in NAME_RE.captures_iter(payload) {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if name.is_empty() || !seen.insert(name.to_string()) {
                continue;
            }

            // Sibling fields live close to the name in the serialized record;
            // a bounded window keeps one record from bleeding into the next.
            let start = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let end = floor_char_boundary(payload, (start + FIELD_WINDOW).min(payload.len()));
            let window = &payload[start..end];

            hits.push(SearchHit {
                name: name.to_string(),
                version: capture_str(&VERSION_RE, window),
                description: capture_str(&DESCRIPTION_RE, window),
                last_publish: capture_str(&DATE_RE, window),
                ..SearchHit::default()
            });
        }

        Ok(hits)
    }

    fn detail_fields(&self, payload: &str) -> Result<DetailFields, ExtractError> {
        Ok(super::scan_detail_markers(payload))
    }
}

fn capture_str(re: &Regex, window: &str) -> String {
    re.captures(window)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Largest char boundary not past `index`.
fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
