//! Primary extraction strategy: the page's embedded state blob.
//!
//! npm pages ship their data as a JSON object assigned to
//! `window.__INITIAL_STATE__` inside a script tag. This extractor locates the
//! marker, parses the single JSON object that follows it, and reads the
//! search results out of `search.packages` with field-level defaults so that
//! partial or evolved payloads degrade to zero values instead of failing.

use serde::Deserialize;

use super::types::{DetailFields, ExtractError, Extractor, SearchHit};

/// Boundary marker for the embedded state blob.
const STATE_MARKER: &str = "window.__INITIAL_STATE__";

/// State-blob extraction strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct StateBlockExtractor;

impl StateBlockExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Locate the JSON object assigned to the state marker.
    ///
    /// Returns `None` when the marker (or an object after it) is absent,
    /// a legitimate page state rather than an error.
    fn locate_block(payload: &str) -> Option<&str> {
        let marker = payload.find(STATE_MARKER)?;
        let after = &payload[marker + STATE_MARKER.len()..];
        let eq = after.find('=')?;
        let after_eq = after[eq + 1..].trim_start();
        after_eq.starts_with('{').then_some(after_eq)
    }
}

impl Extractor for StateBlockExtractor {
    fn name(&self) -> &'static str {
        "state_block"
    }

    fn search_hits(&self, payload: &str) -> Result<Vec<SearchHit>, ExtractError> {
        let Some(block) = Self::locate_block(payload) else {
            return Ok(Vec::new());
        };

        // The stream deserializer stops at the end of the first JSON value,
        // so the trailing `;` and the rest of the script are never seen.
        let mut stream = serde_json::Deserializer::from_str(block).into_iter::<StateBlob>();
        let blob = match stream.next() {
            Some(Ok(blob)) => blob,
            Some(Err(e)) => return Err(ExtractError::MalformedStateBlock(e.to_string())),
            None => {
                return Err(ExtractError::MalformedStateBlock(
                    "empty assignment".to_string(),
                ))
            }
        };

        Ok(blob
            .search
            .packages
            .into_iter()
            .filter(|p| !p.name.is_empty())
            .map(RawPackage::into_hit)
            .collect())
    }

    fn detail_fields(&self, payload: &str) -> Result<DetailFields, ExtractError> {
        Ok(super::scan_detail_markers(payload))
    }
}

// Payload models. Every field defaults independently; unknown fields in the
// blob are ignored.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StateBlob {
    search: SearchSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchSection {
    packages: Vec<RawPackage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPackage {
    name: String,
    version: String,
    description: String,
    author: RawAuthor,
    license: String,
    downloads: RawDownloads,
    dependents: u64,
    date: String,
    links: RawLinks,
    keywords: Vec<String>,
    score: RawScore,
}

impl RawPackage {
    fn into_hit(self) -> SearchHit {
        SearchHit {
            name: self.name,
            version: self.version,
            description: self.description,
            author: self.author.name,
            license: self.license,
            downloads_weekly: self.downloads.weekly,
            downloads_monthly: self.downloads.monthly,
            dependents: self.dependents,
            last_publish: self.date,
            homepage: self.links.homepage,
            repository: self.links.repository,
            keywords: self.keywords,
            quality_score: self.score.detail.quality,
            popularity_score: self.score.detail.popularity,
            maintenance_score: self.score.detail.maintenance,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuthor {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDownloads {
    weekly: u64,
    monthly: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLinks {
    homepage: String,
    repository: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScore {
    detail: RawScoreDetail,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScoreDetail {
    quality: f64,
    popularity: f64,
    maintenance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_state(state_json: &str) -> String {
        format!(
            "<html><head><script>window.__INITIAL_STATE__ = {};</script></head>\
             <body>search results</body></html>",
            state_json
        )
    }

    #[test]
    fn extracts_packages_from_state_block() {
        let payload = page_with_state(
            r#"{"search":{"packages":[
                {"name":"react","version":"18.2.0","description":"UI library",
                 "author":{"name":"fb"},"license":"MIT",
                 "downloads":{"weekly":1000,"monthly":4000},"dependents":50,
                 "date":"2024-01-10",
                 "links":{"homepage":"https://react.dev","repository":"https://github.com/facebook/react"},
                 "keywords":["ui","dom"],
                 "score":{"detail":{"quality":0.9,"popularity":0.99,"maintenance":0.8}}},
                {"name":"redux","version":"5.0.0"}
            ]},"other":{"noise":true}}"#,
        );

        let hits = StateBlockExtractor::new().search_hits(&payload).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "react");
        assert_eq!(hits[0].author, "fb");
        assert_eq!(hits[0].downloads_weekly, 1000);
        assert_eq!(hits[0].keywords, vec!["ui", "dom"]);
        assert_eq!(hits[0].quality_score, 0.9);
        // Missing fields default to zero values
        assert_eq!(hits[1].name, "redux");
        assert_eq!(hits[1].description, "");
        assert_eq!(hits[1].downloads_weekly, 0);
        assert_eq!(hits[1].quality_score, 0.0);
    }

    #[test]
    fn absent_marker_yields_empty_not_error() {
        let hits = StateBlockExtractor::new()
            .search_hits("<html><body>nothing here</body></html>")
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn empty_package_list_yields_empty() {
        let payload = page_with_state(r#"{"search":{"packages":[]}}"#);
        let hits = StateBlockExtractor::new().search_hits(&payload).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn malformed_block_is_a_parse_error() {
        let payload = "window.__INITIAL_STATE__ = {\"search\": {unbalanced;";
        let result = StateBlockExtractor::new().search_hits(payload);
        assert!(matches!(
            result,
            Err(ExtractError::MalformedStateBlock(_))
        ));
    }

    #[test]
    fn nameless_entries_are_dropped() {
        let payload = page_with_state(
            r#"{"search":{"packages":[{"version":"1.0.0"},{"name":"kept"}]}}"#,
        );
        let hits = StateBlockExtractor::new().search_hits(&payload).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "kept");
    }

    #[test]
    fn trailing_script_after_block_is_ignored() {
        let payload = format!(
            "window.__INITIAL_STATE__ = {}; window.other = {{\"x\": 1}};",
            r#"{"search":{"packages":[{"name":"a"}]}}"#
        );
        let hits = StateBlockExtractor::new().search_hits(&payload).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn detail_markers_scanned_from_anywhere() {
        let payload = r#"<html>..."unpackedSize":123456,..."fileCount":42,...</html>"#;
        let detail = StateBlockExtractor::new().detail_fields(payload).unwrap();
        assert_eq!(detail.unpacked_size, Some(123_456));
        assert_eq!(detail.file_count, Some(42));
    }

    #[test]
    fn detail_markers_are_independent() {
        let payload = r#"only one: "fileCount":7"#;
        let detail = StateBlockExtractor::new().detail_fields(payload).unwrap();
        assert_eq!(detail.unpacked_size, None);
        assert_eq!(detail.file_count, Some(7));
    }
}
