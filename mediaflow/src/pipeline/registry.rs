//! Shared project handles and the registry of live projects.

use super::project::{Project, Transition, UpstreamSnapshot};
use crate::core::{Metadata, StageKind, StageState};
use crate::errors::MediaflowError;
use dashmap::DashMap;
use parking_lot::RwLock;
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// A cloneable handle to one project's state.
///
/// Every mutation runs under the write lock, so a reader never observes a
/// recorded stage next to a downstream stage that has not been invalidated
/// yet. Reads share the lock with each other.
#[derive(Debug, Clone)]
pub struct ProjectHandle {
    inner: Arc<RwLock<Project>>,
}

impl ProjectHandle {
    /// Wraps a project.
    #[must_use]
    pub fn new(project: Project) -> Self {
        Self {
            inner: Arc::new(RwLock::new(project)),
        }
    }

    /// Returns a consistent copy of the project.
    #[must_use]
    pub fn snapshot(&self) -> Project {
        self.inner.read().clone()
    }

    /// Returns the project identifier.
    #[must_use]
    pub fn id(&self) -> String {
        self.inner.read().id().to_string()
    }

    /// See [`Project::can_execute`].
    #[must_use]
    pub fn can_execute(&self, stage: StageKind) -> bool {
        self.inner.read().can_execute(stage)
    }

    /// See [`Project::query`].
    #[must_use]
    pub fn query(&self, stage: StageKind) -> StageState {
        self.inner.read().query(stage).clone()
    }

    /// See [`Project::record_produced`].
    pub fn record_produced(
        &self,
        stage: StageKind,
        artifact_path: impl Into<String>,
        metadata: Metadata,
    ) -> Result<Transition, MediaflowError> {
        self.inner.write().record_produced(stage, artifact_path, metadata)
    }

    /// See [`Project::commit_produced`].
    pub fn commit_produced(
        &self,
        stage: StageKind,
        artifact_path: impl Into<String>,
        metadata: Metadata,
        snapshot: &UpstreamSnapshot,
    ) -> Result<Transition, MediaflowError> {
        self.inner
            .write()
            .commit_produced(stage, artifact_path, metadata, snapshot)
    }

    /// See [`Project::invalidate`].
    pub fn invalidate(&self, stage: StageKind) -> Transition {
        self.inner.write().invalidate(stage)
    }

    /// See [`Project::reset`].
    pub fn reset(&self) {
        self.inner.write().reset();
    }
}

/// Validates a project identifier: an alphanumeric first character followed
/// by up to 63 alphanumerics, `_` or `-`.
pub fn validate_project_id(id: &str) -> Result<(), MediaflowError> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").ok());

    match pattern {
        Some(re) if re.is_match(id) => Ok(()),
        _ => Err(MediaflowError::InvalidProject(id.to_string())),
    }
}

/// Thread-safe registry of independent projects.
///
/// Distinct projects share no state and can be mutated concurrently.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: DashMap<String, ProjectHandle>,
}

impl ProjectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new project, failing if the id is taken or invalid.
    pub fn create(&self, id: &str) -> Result<ProjectHandle, MediaflowError> {
        validate_project_id(id)?;
        match self.projects.entry(id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(MediaflowError::ProjectExists(id.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let handle = ProjectHandle::new(Project::new(id));
                slot.insert(handle.clone());
                tracing::info!(project = %id, "Project created");
                Ok(handle)
            }
        }
    }

    /// Returns the project, creating it when absent.
    pub fn get_or_create(&self, id: &str) -> Result<ProjectHandle, MediaflowError> {
        validate_project_id(id)?;
        Ok(self
            .projects
            .entry(id.to_string())
            .or_insert_with(|| ProjectHandle::new(Project::new(id)))
            .clone())
    }

    /// Returns the project registered under `id`.
    pub fn get(&self, id: &str) -> Result<ProjectHandle, MediaflowError> {
        self.projects
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| MediaflowError::UnknownProject(id.to_string()))
    }

    /// Removes a project. Existing handles keep working on the detached state.
    pub fn remove(&self, id: &str) -> Result<(), MediaflowError> {
        if self.projects.remove(id).is_none() {
            return Err(MediaflowError::UnknownProject(id.to_string()));
        }
        tracing::info!(project = %id, "Project removed");
        Ok(())
    }

    /// Returns every registered project id, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.projects.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Returns the number of registered projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Returns true if no project is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_validation() {
        assert!(validate_project_id("demo").is_ok());
        assert!(validate_project_id("my_project-2").is_ok());
        assert!(validate_project_id("").is_err());
        assert!(validate_project_id("-leading").is_err());
        assert!(validate_project_id("../escape").is_err());
        assert!(validate_project_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_create_and_get() {
        let registry = ProjectRegistry::new();
        assert!(registry.is_empty());

        registry.create("demo").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("demo").unwrap().id(), "demo");
    }

    #[test]
    fn test_create_duplicate_fails() {
        let registry = ProjectRegistry::new();
        registry.create("demo").unwrap();
        assert!(matches!(
            registry.create("demo"),
            Err(MediaflowError::ProjectExists(_))
        ));
    }

    #[test]
    fn test_get_or_create_returns_same_state() {
        let registry = ProjectRegistry::new();
        let a = registry.get_or_create("demo").unwrap();
        a.record_produced(StageKind::Image, "a.png", Metadata::new()).unwrap();

        let b = registry.get_or_create("demo").unwrap();
        assert!(b.query(StageKind::Image).is_ready());
    }

    #[test]
    fn test_remove_and_list() {
        let registry = ProjectRegistry::new();
        registry.create("b").unwrap();
        registry.create("a").unwrap();
        assert_eq!(registry.list(), vec!["a".to_string(), "b".to_string()]);

        registry.remove("a").unwrap();
        assert!(registry.get("a").is_err());
        assert!(registry.remove("a").is_err());
    }

    #[test]
    fn test_projects_are_independent() {
        let registry = ProjectRegistry::new();
        let one = registry.create("one").unwrap();
        let two = registry.create("two").unwrap();

        one.record_produced(StageKind::Image, "a.png", Metadata::new()).unwrap();
        assert!(two.query(StageKind::Image).is_empty());
    }

    #[test]
    fn test_concurrent_mutations_keep_invariants() {
        let handle = ProjectHandle::new(Project::new("demo"));
        handle.record_produced(StageKind::Image, "a.png", Metadata::new()).unwrap();
        handle.record_produced(StageKind::Speech, "c.wav", Metadata::new()).unwrap();

        std::thread::scope(|scope| {
            for i in 0..4 {
                let h = handle.clone();
                scope.spawn(move || {
                    for j in 0..50 {
                        let video = format!("v{i}_{j}.mp4");
                        let lipsync = format!("l{i}_{j}.mp4");
                        let _ = h.record_produced(StageKind::Video, video, Metadata::new());
                        let _ = h.record_produced(StageKind::LipSync, lipsync, Metadata::new());
                        if j % 7 == 0 {
                            let _ = h.record_produced(StageKind::Image, "a.png", Metadata::new());
                        }
                    }
                });
            }
            let reader = handle.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    let p = reader.snapshot();
                    if p.query(StageKind::LipSync).is_ready() {
                        assert!(p.query(StageKind::Video).is_ready());
                        assert!(p.query(StageKind::Image).is_ready());
                    }
                    if p.query(StageKind::Video).is_ready() {
                        assert!(p.query(StageKind::Image).is_ready());
                    }
                }
            });
        });
    }
}
