//! Result ordering.
//!
//! The enrichment phase completes tasks in whatever order the workers finish;
//! ordering of the final sequence is imposed here. Callers hand in packages
//! already arranged in discovery order, so `relevance` is the identity and
//! every keyed sort breaks ties by discovery position (stable sort).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::Package;

/// Key selecting the output ordering of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Unpacked size in bytes, largest first.
    Size,
    /// Last-publish string, lexicographically latest first (not
    /// calendar-aware).
    Date,
    /// Weekly downloads, highest first.
    Downloads,
    /// Dependent count, highest first.
    Dependents,
    /// Discovery order: pages in fetch order, source order within a page.
    #[default]
    Relevance,
}

impl SortKey {
    /// Parse a key name. Unrecognized names degrade to `Relevance` rather
    /// than failing the run.
    pub fn parse(s: &str) -> Self {
        match s {
            "size" => Self::Size,
            "date" => Self::Date,
            "downloads" => Self::Downloads,
            "dependents" => Self::Dependents,
            _ => Self::Relevance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Date => "date",
            Self::Downloads => "downloads",
            Self::Dependents => "dependents",
            Self::Relevance => "relevance",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Sort packages in place by the given key.
///
/// All keyed orders are descending and stable: packages with equal keys keep
/// their prior relative order. `Relevance` leaves the slice untouched.
pub fn sort_packages(packages: &mut [Package], key: SortKey) {
    match key {
        SortKey::Size => packages.sort_by(|a, b| b.size.cmp(&a.size)),
        SortKey::Date => packages.sort_by(|a, b| b.last_publish.cmp(&a.last_publish)),
        SortKey::Downloads => {
            packages.sort_by(|a, b| b.downloads_weekly.cmp(&a.downloads_weekly))
        }
        SortKey::Dependents => packages.sort_by(|a, b| b.dependents.cmp(&a.dependents)),
        SortKey::Relevance => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, size: u64) -> Package {
        Package {
            name: name.to_string(),
            size,
            ..Package::default()
        }
    }

    #[test]
    fn size_sorts_descending() {
        let mut packages = vec![pkg("a", 10), pkg("b", 50), pkg("c", 30)];
        sort_packages(&mut packages, SortKey::Size);
        let sizes: Vec<u64> = packages.iter().map(|p| p.size).collect();
        assert_eq!(sizes, vec![50, 30, 10]);
    }

    #[test]
    fn equal_keys_preserve_prior_order() {
        let mut packages = vec![pkg("first", 10), pkg("second", 10), pkg("third", 10)];
        sort_packages(&mut packages, SortKey::Size);
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn date_sorts_lexicographically_descending() {
        let mut packages = vec![pkg("a", 0), pkg("b", 0), pkg("c", 0)];
        packages[0].last_publish = "2023-01-05".to_string();
        packages[1].last_publish = "2024-11-30".to_string();
        packages[2].last_publish = "2024-02-01".to_string();
        sort_packages(&mut packages, SortKey::Date);
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn downloads_sorts_by_weekly_count() {
        let mut packages = vec![pkg("a", 0), pkg("b", 0)];
        packages[0].downloads_weekly = 5;
        packages[1].downloads_weekly = 500;
        sort_packages(&mut packages, SortKey::Downloads);
        assert_eq!(packages[0].name, "b");
    }

    #[test]
    fn dependents_sorts_descending() {
        let mut packages = vec![pkg("a", 0), pkg("b", 0)];
        packages[0].dependents = 2;
        packages[1].dependents = 9;
        sort_packages(&mut packages, SortKey::Dependents);
        assert_eq!(packages[0].name, "b");
    }

    #[test]
    fn relevance_keeps_discovery_order() {
        let mut packages = vec![pkg("z", 1), pkg("a", 99), pkg("m", 50)];
        sort_packages(&mut packages, SortKey::Relevance);
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn unrecognized_key_parses_as_relevance() {
        assert_eq!(SortKey::parse("size"), SortKey::Size);
        assert_eq!(SortKey::parse("dependents"), SortKey::Dependents);
        assert_eq!(SortKey::parse("seeders"), SortKey::Relevance);
        assert_eq!(SortKey::parse(""), SortKey::Relevance);
    }

    #[test]
    fn sort_key_serde_round_trip() {
        let json = serde_json::to_string(&SortKey::Downloads).unwrap();
        assert_eq!(json, "\"downloads\"");
        let parsed: SortKey = serde_json::from_str("\"date\"").unwrap();
        assert_eq!(parsed, SortKey::Date);
        let fallback: SortKey = serde_json::from_str("\"bogus\"").unwrap();
        assert_eq!(fallback, SortKey::Relevance);
    }
}
