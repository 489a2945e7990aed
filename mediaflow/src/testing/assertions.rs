//! Test assertions for project state.

use crate::core::StageKind;
use crate::pipeline::Project;

/// Asserts that `stage` is `Ready`.
pub fn assert_stage_ready(project: &Project, stage: StageKind) {
    assert!(
        project.query(stage).is_ready(),
        "Expected stage '{}' to be ready, got {:?}",
        stage,
        project.query(stage)
    );
}

/// Asserts that `stage` is `Ready` with the given artifact path.
pub fn assert_stage_ready_at(project: &Project, stage: StageKind, path: &str) {
    assert_eq!(
        project.query(stage).artifact_path(),
        Some(path),
        "Expected stage '{}' to be ready at '{}'",
        stage,
        path
    );
}

/// Asserts that `stage` is `Empty`.
pub fn assert_stage_empty(project: &Project, stage: StageKind) {
    assert!(
        project.query(stage).is_empty(),
        "Expected stage '{}' to be empty, got {:?}",
        stage,
        project.query(stage)
    );
}

/// Asserts that `stage` can be executed.
pub fn assert_executable(project: &Project, stage: StageKind) {
    assert!(
        project.can_execute(stage),
        "Expected stage '{}' to be executable; unsatisfied: {:?}",
        stage,
        project.unsatisfied_dependencies(stage)
    );
}

/// Asserts that `stage` cannot be executed.
pub fn assert_not_executable(project: &Project, stage: StageKind) {
    assert!(
        !project.can_execute(stage),
        "Expected stage '{}' not to be executable",
        stage
    );
}
