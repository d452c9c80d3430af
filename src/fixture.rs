//! Fixture loading
//!
//! Reads the function source that gets uploaded on creation.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Error while reading source code file {}: {source}", path.display())]
pub struct FixtureError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Source text of the function under test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSource {
    path: PathBuf,
    code: String,
}

impl FunctionSource {
    /// Read the whole file at `path`
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let path = path.as_ref().to_path_buf();
        let code = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FixtureError {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), bytes = code.len(), "Loaded function source");

        Ok(Self { path, code })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}
