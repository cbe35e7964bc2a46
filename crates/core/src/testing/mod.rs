//! Testing utilities and mock implementations.
//!
//! This module provides a scriptable fetcher plus payload fixtures, allowing
//! full pipeline tests without real network infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use pakrat_core::testing::{fixtures, MockFetcher};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.script(
//!     "https://host/search?q=react&page=1",
//!     fixtures::search_page(&[fixtures::package_entry("react")]),
//! ).await;
//! ```

mod mock_fetcher;

pub use mock_fetcher::{MockFetcher, ScriptedResponse};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    /// A search page whose state blob carries the given package entries.
    pub fn search_page(packages: &[Value]) -> String {
        format!(
            "<html><head><script>window.__INITIAL_STATE__ = {};</script></head>\
             <body>results</body></html>",
            json!({ "search": { "packages": packages } })
        )
    }

    /// A search page with results but no embedded state blob at all.
    pub fn blobless_page() -> String {
        "<html><body>rendered without state</body></html>".to_string()
    }

    /// A search page signalling exhaustion (empty package list).
    pub fn empty_search_page() -> String {
        search_page(&[])
    }

    /// One package entry for a search page, with reasonable defaults.
    pub fn package_entry(name: &str) -> Value {
        json!({
            "name": name,
            "version": "1.0.0",
            "description": format!("the {name} package"),
            "author": { "name": "someone" },
            "license": "MIT",
            "downloads": { "weekly": 1000, "monthly": 4000 },
            "dependents": 3,
            "date": "2024-05-01",
            "links": {
                "homepage": format!("https://example.com/{name}"),
                "repository": format!("https://github.com/example/{name}"),
            },
            "keywords": ["test"],
            "score": { "detail": { "quality": 0.8, "popularity": 0.6, "maintenance": 0.7 } }
        })
    }

    /// A detail page carrying both numeric markers.
    pub fn detail_page(size: u64, files: u64) -> String {
        format!(
            "<html><script>{{\"package\":{{\"unpackedSize\":{size},\"fileCount\":{files}}}}}\
             </script></html>"
        )
    }
}
