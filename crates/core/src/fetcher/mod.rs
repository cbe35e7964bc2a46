//! Outbound page fetching.
//!
//! This module provides a `Fetcher` trait for retrieving raw page payloads,
//! with retry/backoff handled entirely below the trait: callers see a body or
//! a terminal failure, never an in-flight retry.

mod http;
mod types;

pub use http::{HttpFetcher, RetryPolicy};
pub use types::*;
