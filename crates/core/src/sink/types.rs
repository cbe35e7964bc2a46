//! Types for result persistence.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::Package;

/// Errors that can occur while persisting a result set.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for result-set persistence backends.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Persist the ordered packages under the given artifact stem.
    ///
    /// Returns the path of the artifact written for this run.
    async fn persist(&self, packages: &[Package], stem: &str) -> Result<PathBuf, SinkError>;
}
