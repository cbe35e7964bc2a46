//! JSON file sink implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tracing::info;

use crate::model::Package;

use super::types::{Sink, SinkError};

/// Writes each run as one self-contained JSON artifact,
/// `{stem}-{timestamp}.json`, in the configured directory.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn artifact_path(&self, stem: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
        self.dir.join(format!("{stem}-{timestamp}.json"))
    }
}

#[async_trait]
impl Sink for JsonFileSink {
    async fn persist(&self, packages: &[Package], stem: &str) -> Result<PathBuf, SinkError> {
        let path = self.artifact_path(stem);

        if !self.dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&self.dir).await?;
        }

        let body = serde_json::to_vec_pretty(packages)?;
        tokio::fs::write(&path, body).await?;

        info!(
            path = %path.display(),
            packages = packages.len(),
            "results written"
        );
        Ok(path)
    }
}

/// Read an artifact back into memory.
///
/// The inverse of [`JsonFileSink::persist`]; mostly useful for tooling and
/// tests over previously written runs.
pub async fn read_artifact(path: &Path) -> Result<Vec<Package>, SinkError> {
    let body = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&body)?)
}
