//! Result persistence.
//!
//! This module provides a `Sink` trait for writing a run's ordered result
//! set to durable storage, with a JSON file implementation.

mod json;
mod types;

pub use json::{read_artifact, JsonFileSink};
pub use types::*;
