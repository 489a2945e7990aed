//! Artifact storage addressed by root-relative paths.
//!
//! The store is the only component that touches bytes on disk. It receives
//! validated [`ProjectPath`]s and never sees absolute paths from callers.

mod fs;
mod memory;

pub use fs::FsArtifactStore;
pub use memory::InMemoryArtifactStore;

use crate::errors::PathEscapeError;
use crate::paths::ProjectPath;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors raised by an artifact store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No artifact exists at the path.
    #[error("Artifact not found: {0}")]
    NotFound(ProjectPath),

    /// The path resolved outside the store root.
    #[error("{0}")]
    PathEscape(#[from] PathEscapeError),

    /// Underlying IO failure.
    #[error("IO error on '{path}': {source}")]
    Io {
        /// The path being accessed.
        path: ProjectPath,
        /// The IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Storage for stage artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync + std::fmt::Debug {
    /// Returns true if an artifact exists at `path`.
    async fn exists(&self, path: &ProjectPath) -> Result<bool, StoreError>;

    /// Writes `bytes` to `path`, replacing any existing artifact, and returns
    /// the path written.
    async fn write(&self, path: &ProjectPath, bytes: Vec<u8>) -> Result<ProjectPath, StoreError>;

    /// Reads the artifact at `path`.
    async fn read(&self, path: &ProjectPath) -> Result<Vec<u8>, StoreError>;

    /// Copies the artifact at `from` to `to`.
    async fn copy(&self, from: &ProjectPath, to: &ProjectPath) -> Result<ProjectPath, StoreError> {
        let bytes = self.read(from).await?;
        self.write(to, bytes).await
    }
}

/// Returns the hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
