//! In-memory artifact store, used by tests and dry runs.

use super::{ArtifactStore, StoreError};
use crate::paths::ProjectPath;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Keeps artifacts in a map keyed by path.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    files: RwLock<HashMap<ProjectPath, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<ProjectPath> {
        let mut paths: Vec<_> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Returns the number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn exists(&self, path: &ProjectPath) -> Result<bool, StoreError> {
        Ok(self.files.read().contains_key(path))
    }

    async fn write(&self, path: &ProjectPath, bytes: Vec<u8>) -> Result<ProjectPath, StoreError> {
        self.files.write().insert(path.clone(), bytes);
        Ok(path.clone())
    }

    async fn read(&self, path: &ProjectPath) -> Result<Vec<u8>, StoreError> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip() {
        let store = InMemoryArtifactStore::new();
        let path = ProjectPath::parse("data/a.png").unwrap();

        assert!(!store.exists(&path).await.unwrap());
        store.write(&path, vec![7]).await.unwrap();
        assert!(store.exists(&path).await.unwrap());
        assert_eq!(store.read(&path).await.unwrap(), vec![7]);
        assert_eq!(store.len(), 1);
    }
}
