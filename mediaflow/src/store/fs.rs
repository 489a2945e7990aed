//! Filesystem-backed artifact store.

use super::{ArtifactStore, StoreError};
use crate::paths::{ProjectPath, ProjectRoot};
use async_trait::async_trait;
use std::io::ErrorKind;
use tracing::debug;

/// Stores artifacts as files below a project root.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: ProjectRoot,
}

impl FsArtifactStore {
    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn new(root: ProjectRoot) -> Self {
        Self { root }
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &ProjectRoot {
        &self.root
    }

    fn io_error(path: &ProjectPath, source: std::io::Error) -> StoreError {
        if source.kind() == ErrorKind::NotFound {
            StoreError::NotFound(path.clone())
        } else {
            StoreError::Io {
                path: path.clone(),
                source,
            }
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn exists(&self, path: &ProjectPath) -> Result<bool, StoreError> {
        let full = self.root.resolve_contained(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_error(path, e)),
        }
    }

    async fn write(&self, path: &ProjectPath, bytes: Vec<u8>) -> Result<ProjectPath, StoreError> {
        let full = self.root.resolve_contained(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(path, e))?;
        }
        // Re-check now that intermediate directories exist.
        let full = self.root.resolve_contained(path)?;
        let size = bytes.len();
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| Self::io_error(path, e))?;

        debug!(path = %path, size, "Artifact written");
        Ok(path.clone())
    }

    async fn read(&self, path: &ProjectPath) -> Result<Vec<u8>, StoreError> {
        let full = self.root.resolve_contained(path)?;
        tokio::fs::read(&full).await.map_err(|e| Self::io_error(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(ProjectRoot::new(dir.path()));
        (dir, store)
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let (dir, store) = store();
        let path = ProjectPath::parse("data/generated_images/a.png").unwrap();

        store.write(&path, vec![1, 2, 3]).await.unwrap();

        assert!(dir.path().join("data/generated_images/a.png").is_file());
        assert!(store.exists(&path).await.unwrap());
        assert_eq!(store.read(&path).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let (_dir, store) = store();
        let path = ProjectPath::parse("data/missing.wav").unwrap();

        assert!(!store.exists(&path).await.unwrap());
        assert!(matches!(store.read(&path).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_directory_is_not_an_artifact() {
        let (dir, store) = store();
        std::fs::create_dir_all(dir.path().join("data/final_videos")).unwrap();
        let path = ProjectPath::parse("data/final_videos").unwrap();
        assert!(!store.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_copy() {
        let (_dir, store) = store();
        let from = ProjectPath::parse("data/lipsync_videos/d.mp4").unwrap();
        let to = ProjectPath::parse("data/final_videos/e.mp4").unwrap();
        store.write(&from, b"clip".to_vec()).await.unwrap();

        store.copy(&from, &to).await.unwrap();
        assert_eq!(store.read(&to).await.unwrap(), b"clip".to_vec());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_rejected() {
        let (dir, store) = store();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let path = ProjectPath::parse("link/secret.txt").unwrap();
        assert!(matches!(store.read(&path).await, Err(StoreError::PathEscape(_))));
    }
}
