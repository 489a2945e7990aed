//! Per-project pipeline state tracker.
//!
//! A [`Project`] owns the `StageKind -> StageState` mapping and enforces the
//! two pipeline invariants:
//!
//! - a stage may only become `Ready` while every required upstream stage is
//!   `Ready`;
//! - whenever a stage is recorded (or forced empty), its whole downstream
//!   closure becomes `Empty`.
//!
//! The tracker never runs executors and never touches the artifact store;
//! callers do that and report the outcome here.

use super::graph::DependencyGraph;
use crate::core::{Metadata, StageArtifact, StageKind, StageState};
use crate::errors::{MediaflowError, PreconditionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// The outcome of a state mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    /// The stage that was recorded or forced empty.
    pub stage: StageKind,
    /// The new artifact, when the stage was recorded.
    pub artifact: Option<StageArtifact>,
    /// Downstream stages that went from `Ready` to `Empty`.
    pub invalidated: Vec<StageKind>,
}

/// Project state observed when a stage execution started.
///
/// Committing against a stale snapshot fails, so an executor that consumed
/// an artifact which has since been replaced cannot publish its output, and
/// a stage that was invalidated or reset while running stays `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamSnapshot {
    stage: Option<StageKind>,
    clears: u64,
    generations: Vec<(StageKind, Option<u64>)>,
}

impl UpstreamSnapshot {
    /// Returns the observed `(stage, generation)` pairs.
    #[must_use]
    pub fn generations(&self) -> &[(StageKind, Option<u64>)] {
        &self.generations
    }

    /// Returns how many times the executing stage had been forced `Empty`.
    #[must_use]
    pub const fn clears(&self) -> u64 {
        self.clears
    }
}

/// A named unit of work and the state of each of its stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    id: String,
    stages: BTreeMap<StageKind, StageState>,
    generation: u64,
    #[serde(default)]
    clears: BTreeMap<StageKind, u64>,
    created_at: String,
    updated_at: String,
}

impl Project {
    /// Creates a project with every stage `Empty`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let now = crate::utils::iso_timestamp();
        Self {
            id: id.into(),
            stages: empty_stages(),
            generation: 0,
            clears: BTreeMap::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the number of recordings made so far.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns when the project was created (ISO 8601).
    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Returns when the project state last changed (ISO 8601).
    #[must_use]
    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn graph() -> &'static DependencyGraph {
        DependencyGraph::media_pipeline()
    }

    /// Returns the current state of `stage`.
    #[must_use]
    pub fn query(&self, stage: StageKind) -> &StageState {
        static EMPTY: StageState = StageState::Empty;
        self.stages.get(&stage).unwrap_or(&EMPTY)
    }

    /// Iterates over every stage and its state, in pipeline order.
    pub fn states(&self) -> impl Iterator<Item = (StageKind, &StageState)> {
        self.stages.iter().map(|(k, v)| (*k, v))
    }

    /// Returns the required upstream stages of `stage` that are not `Ready`.
    #[must_use]
    pub fn unsatisfied_dependencies(&self, stage: StageKind) -> Vec<StageKind> {
        Self::graph()
            .required_upstream(stage)
            .into_iter()
            .filter(|up| !self.query(*up).is_ready())
            .collect()
    }

    /// Returns true iff every required upstream stage of `stage` is `Ready`.
    #[must_use]
    pub fn can_execute(&self, stage: StageKind) -> bool {
        self.unsatisfied_dependencies(stage).is_empty()
    }

    /// Returns every stage that may currently be executed.
    #[must_use]
    pub fn executable_stages(&self) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(|s| self.can_execute(*s))
            .collect()
    }

    /// Returns how many times `stage` has been forced `Empty` by an
    /// invalidation or a reset.
    #[must_use]
    pub fn clear_count(&self, stage: StageKind) -> u64 {
        self.clears.get(&stage).copied().unwrap_or(0)
    }

    /// Captures the generations of every upstream stage of `stage`, and how
    /// often `stage` itself has been cleared.
    #[must_use]
    pub fn upstream_snapshot(&self, stage: StageKind) -> UpstreamSnapshot {
        let generations = Self::graph()
            .upstream_of(stage)
            .iter()
            .map(|edge| {
                let generation = self.query(edge.upstream).artifact().map(|a| a.generation);
                (edge.upstream, generation)
            })
            .collect();
        UpstreamSnapshot {
            stage: Some(stage),
            clears: self.clear_count(stage),
            generations,
        }
    }

    /// Records a freshly produced artifact for `stage` and invalidates its
    /// downstream closure.
    ///
    /// Recording always invalidates downstream, even when the path and
    /// metadata equal the current artifact: the tracker cannot tell whether
    /// the bytes changed.
    pub fn record_produced(
        &mut self,
        stage: StageKind,
        artifact_path: impl Into<String>,
        metadata: Metadata,
    ) -> Result<Transition, MediaflowError> {
        let missing = self.unsatisfied_dependencies(stage);
        if !missing.is_empty() {
            return Err(PreconditionError::dependencies_unsatisfied(stage, missing).into());
        }
        self.apply_produced(stage, artifact_path.into(), metadata)
    }

    /// Like [`record_produced`](Self::record_produced), but also requires the
    /// upstream artifacts to be the ones captured in `snapshot`, and `stage`
    /// not to have been invalidated or reset since.
    pub fn commit_produced(
        &mut self,
        stage: StageKind,
        artifact_path: impl Into<String>,
        metadata: Metadata,
        snapshot: &UpstreamSnapshot,
    ) -> Result<Transition, MediaflowError> {
        let missing = self.unsatisfied_dependencies(stage);
        if !missing.is_empty() {
            return Err(PreconditionError::dependencies_unsatisfied(stage, missing).into());
        }

        let mut changed: Vec<StageKind> = snapshot
            .generations
            .iter()
            .filter(|(up, seen)| self.query(*up).artifact().map(|a| a.generation) != *seen)
            .map(|(up, _)| *up)
            .collect();
        if snapshot.stage == Some(stage) && self.clear_count(stage) != snapshot.clears {
            changed.push(stage);
        }
        if !changed.is_empty() {
            return Err(PreconditionError::stale_upstream(stage, changed).into());
        }

        self.apply_produced(stage, artifact_path.into(), metadata)
    }

    fn apply_produced(
        &mut self,
        stage: StageKind,
        artifact_path: String,
        metadata: Metadata,
    ) -> Result<Transition, MediaflowError> {
        if artifact_path.trim().is_empty() {
            return Err(MediaflowError::InvalidArtifact {
                stage,
                reason: "artifact path must not be empty".to_string(),
            });
        }

        self.generation += 1;
        let artifact = StageArtifact::new(artifact_path, self.generation).with_metadata(metadata);
        self.stages.insert(stage, StageState::Ready(artifact.clone()));
        let invalidated = self.invalidate_downstream(stage);
        self.touch();

        debug!(
            project = %self.id,
            stage = %stage,
            path = %artifact.path,
            ?invalidated,
            "Recorded stage artifact"
        );

        Ok(Transition {
            stage,
            artifact: Some(artifact),
            invalidated,
        })
    }

    /// Forces `stage` to `Empty` and invalidates its downstream closure.
    pub fn invalidate(&mut self, stage: StageKind) -> Transition {
        self.stages.insert(stage, StageState::Empty);
        self.bump_clears(stage);
        let invalidated = self.invalidate_downstream(stage);
        self.touch();

        debug!(project = %self.id, stage = %stage, ?invalidated, "Invalidated stage");

        Transition {
            stage,
            artifact: None,
            invalidated,
        }
    }

    /// Sets every stage to `Empty`.
    ///
    /// Executions that started before the reset can no longer commit.
    pub fn reset(&mut self) {
        self.stages = empty_stages();
        for stage in StageKind::ALL {
            self.bump_clears(stage);
        }
        self.touch();
    }

    /// Empties the downstream closure of `stage`, returning the stages that
    /// were `Ready` before.
    fn invalidate_downstream(&mut self, stage: StageKind) -> Vec<StageKind> {
        let mut invalidated = Vec::new();
        for downstream in Self::graph().downstream_closure(stage) {
            let previous = self.stages.insert(downstream, StageState::Empty);
            self.bump_clears(downstream);
            if previous.is_some_and(|s| s.is_ready()) {
                invalidated.push(downstream);
            }
        }
        invalidated
    }

    fn bump_clears(&mut self, stage: StageKind) {
        *self.clears.entry(stage).or_insert(0) += 1;
    }

    fn touch(&mut self) {
        self.updated_at = crate::utils::iso_timestamp();
    }
}

fn empty_stages() -> BTreeMap<StageKind, StageState> {
    StageKind::ALL
        .into_iter()
        .map(|s| (s, StageState::Empty))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta(key: &str, value: serde_json::Value) -> Metadata {
        Metadata::from([(key.to_string(), value)])
    }

    fn record(project: &mut Project, stage: StageKind, path: &str) -> Transition {
        project.record_produced(stage, path, Metadata::new()).unwrap()
    }

    /// Image, Video, Speech, LipSync, Music, Sfx and Assembly all `Ready`.
    fn full_project() -> Project {
        let mut p = Project::new("demo");
        record(&mut p, StageKind::Image, "data/generated_images/a.png");
        record(&mut p, StageKind::Video, "data/generated_videos/b.mp4");
        record(&mut p, StageKind::Speech, "data/generated_audio/speech/c.wav");
        record(&mut p, StageKind::Music, "data/generated_audio/music/m.wav");
        record(&mut p, StageKind::Sfx, "data/generated_audio/sfx/s.wav");
        record(&mut p, StageKind::LipSync, "data/lipsync_videos/d.mp4");
        record(&mut p, StageKind::Assembly, "data/final_videos/e.mp4");
        p
    }

    #[test]
    fn test_new_project_is_empty() {
        let p = Project::new("demo");
        assert_eq!(p.id(), "demo");
        assert!(p.states().all(|(_, s)| s.is_empty()));
        assert_eq!(p.states().count(), 7);
    }

    #[test]
    fn test_root_stages_always_executable() {
        let p = Project::new("demo");
        for stage in [StageKind::Image, StageKind::Speech, StageKind::Music, StageKind::Sfx] {
            assert!(p.can_execute(stage), "{stage}");
        }
        for stage in [StageKind::Video, StageKind::LipSync, StageKind::Assembly] {
            assert!(!p.can_execute(stage), "{stage}");
        }
    }

    #[test]
    fn test_can_execute_requires_every_dependency() {
        let mut p = Project::new("demo");
        record(&mut p, StageKind::Image, "a.png");
        record(&mut p, StageKind::Video, "b.mp4");
        assert!(!p.can_execute(StageKind::LipSync));

        record(&mut p, StageKind::Speech, "c.wav");
        assert!(p.can_execute(StageKind::LipSync));

        p.invalidate(StageKind::Video);
        assert!(!p.can_execute(StageKind::LipSync));
        assert_eq!(p.unsatisfied_dependencies(StageKind::LipSync), vec![StageKind::Video]);
    }

    #[test]
    fn test_flipping_any_assembly_dependency_blocks_it() {
        for dep in [StageKind::LipSync, StageKind::Speech] {
            let mut p = full_project();
            assert!(p.can_execute(StageKind::Assembly));
            p.invalidate(dep);
            assert!(!p.can_execute(StageKind::Assembly), "{dep}");
        }
    }

    #[test]
    fn test_music_and_sfx_do_not_gate_assembly() {
        let mut p = full_project();
        p.invalidate(StageKind::Music);
        p.invalidate(StageKind::Sfx);
        assert!(p.can_execute(StageKind::Assembly));
    }

    #[test]
    fn test_regenerating_image_invalidates_full_chain() {
        let mut p = Project::new("demo");
        record(&mut p, StageKind::Image, "p.png");
        record(&mut p, StageKind::Video, "p2.mp4");
        record(&mut p, StageKind::Speech, "s.wav");
        record(&mut p, StageKind::LipSync, "p3.mp4");
        record(&mut p, StageKind::Assembly, "p4.mp4");

        let t = record(&mut p, StageKind::Image, "p5.png");

        assert_eq!(
            t.invalidated,
            vec![StageKind::Video, StageKind::LipSync, StageKind::Assembly]
        );
        assert!(p.query(StageKind::Video).is_empty());
        assert!(p.query(StageKind::LipSync).is_empty());
        assert!(p.query(StageKind::Assembly).is_empty());
        assert_eq!(p.query(StageKind::Image).artifact_path(), Some("p5.png"));
        assert!(p.query(StageKind::Speech).is_ready());
    }

    #[test]
    fn test_regenerating_music_invalidates_only_assembly() {
        let mut p = full_project();
        let t = record(&mut p, StageKind::Music, "data/generated_audio/music/m2.wav");

        assert_eq!(t.invalidated, vec![StageKind::Assembly]);
        assert!(p.query(StageKind::Assembly).is_empty());
        assert!(p.query(StageKind::LipSync).is_ready());
        assert!(p.query(StageKind::Speech).is_ready());
    }

    #[test]
    fn test_regenerating_sfx_invalidates_only_assembly() {
        let mut p = full_project();
        let t = record(&mut p, StageKind::Sfx, "data/generated_audio/sfx/s2.wav");

        assert_eq!(t.invalidated, vec![StageKind::Assembly]);
        assert!(p.query(StageKind::LipSync).is_ready());
    }

    #[test]
    fn test_regenerating_speech_invalidates_lipsync_and_assembly() {
        let mut p = full_project();
        let t = record(&mut p, StageKind::Speech, "data/generated_audio/speech/c2.wav");

        assert_eq!(t.invalidated, vec![StageKind::LipSync, StageKind::Assembly]);
        assert!(p.query(StageKind::Video).is_ready());
        assert!(p.query(StageKind::Music).is_ready());
    }

    #[test]
    fn test_rerecording_identical_output_still_invalidates() {
        let mut p = Project::new("demo");
        record(&mut p, StageKind::Image, "a.png");
        record(&mut p, StageKind::Speech, "c.wav");
        let m = meta("fps", serde_json::json!(8));
        p.record_produced(StageKind::Video, "b.mp4", m.clone()).unwrap();
        record(&mut p, StageKind::LipSync, "d.mp4");
        record(&mut p, StageKind::Assembly, "e.mp4");

        let t = p.record_produced(StageKind::Video, "b.mp4", m).unwrap();

        assert_eq!(t.invalidated, vec![StageKind::LipSync, StageKind::Assembly]);
        assert!(p.query(StageKind::LipSync).is_empty());
        assert!(p.query(StageKind::Assembly).is_empty());
    }

    #[test]
    fn test_precondition_failure_leaves_state_unchanged() {
        let mut p = Project::new("demo");
        record(&mut p, StageKind::Speech, "c.wav");
        let before = p.clone();

        let err = p
            .record_produced(StageKind::LipSync, "d.mp4", Metadata::new())
            .unwrap_err();

        match err {
            MediaflowError::Precondition(e) => {
                assert_eq!(e.stage, StageKind::LipSync);
                assert_eq!(e.unsatisfied, vec![StageKind::Video]);
            }
            other => panic!("unexpected error: {other}"),
        }
        for stage in StageKind::ALL {
            assert_eq!(p.query(stage), before.query(stage));
        }
        assert_eq!(p.generation(), before.generation());
    }

    #[test]
    fn test_empty_path_rejected() {
        let mut p = Project::new("demo");
        let err = p.record_produced(StageKind::Image, "  ", Metadata::new()).unwrap_err();
        assert!(matches!(err, MediaflowError::InvalidArtifact { .. }));
        assert!(p.query(StageKind::Image).is_empty());
    }

    #[test]
    fn test_invalidate_forces_origin_and_downstream_empty() {
        let mut p = full_project();
        let t = p.invalidate(StageKind::Video);

        assert!(p.query(StageKind::Video).is_empty());
        assert_eq!(t.invalidated, vec![StageKind::LipSync, StageKind::Assembly]);
        assert!(p.query(StageKind::Image).is_ready());
    }

    #[test]
    fn test_invalidate_empty_stage_reports_nothing() {
        let mut p = Project::new("demo");
        let t = p.invalidate(StageKind::Image);
        assert!(t.invalidated.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut p = full_project();
        p.reset();
        assert!(p.states().all(|(_, s)| s.is_empty()));
        assert_eq!(
            p.executable_stages(),
            vec![StageKind::Image, StageKind::Speech, StageKind::Music, StageKind::Sfx]
        );
    }

    #[test]
    fn test_recording_assembly_keeps_upstream_ready() {
        let p = full_project();
        for stage in StageKind::ALL {
            assert!(p.query(stage).is_ready(), "{stage}");
        }
    }

    #[test]
    fn test_commit_rejects_stale_snapshot() {
        let mut p = Project::new("demo");
        record(&mut p, StageKind::Image, "a.png");
        let snapshot = p.upstream_snapshot(StageKind::Video);

        // Image regenerated while the video executor was running
        record(&mut p, StageKind::Image, "a.png");

        let err = p
            .commit_produced(StageKind::Video, "b.mp4", Metadata::new(), &snapshot)
            .unwrap_err();
        assert!(err.to_string().contains("changed while it was executing"));
        assert!(p.query(StageKind::Video).is_empty());
    }

    #[test]
    fn test_commit_accepts_current_snapshot() {
        let mut p = Project::new("demo");
        record(&mut p, StageKind::Image, "a.png");
        let snapshot = p.upstream_snapshot(StageKind::Video);
        assert_eq!(snapshot.generations(), &[(StageKind::Image, Some(1))]);

        let t = p
            .commit_produced(StageKind::Video, "b.mp4", Metadata::new(), &snapshot)
            .unwrap();
        assert_eq!(t.artifact.unwrap().path, "b.mp4");
    }

    #[test]
    fn test_commit_detects_optional_upstream_change() {
        let mut p = full_project();
        let snapshot = p.upstream_snapshot(StageKind::Assembly);
        record(&mut p, StageKind::Music, "m2.wav");

        let err = p
            .commit_produced(StageKind::Assembly, "e2.mp4", Metadata::new(), &snapshot)
            .unwrap_err();
        assert!(matches!(err, MediaflowError::Precondition(_)));
    }

    #[test]
    fn test_commit_rejected_after_reset() {
        let mut p = Project::new("demo");
        let snapshot = p.upstream_snapshot(StageKind::Image);
        assert_eq!(snapshot.clears(), 0);

        p.reset();
        assert_eq!(p.clear_count(StageKind::Image), 1);

        let err = p
            .commit_produced(StageKind::Image, "a.png", Metadata::new(), &snapshot)
            .unwrap_err();
        match err {
            MediaflowError::Precondition(e) => assert_eq!(e.unsatisfied, vec![StageKind::Image]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(p.query(StageKind::Image).is_empty());
    }

    #[test]
    fn test_commit_rejected_after_own_invalidation() {
        let mut p = Project::new("demo");
        record(&mut p, StageKind::Speech, "c.wav");
        let snapshot = p.upstream_snapshot(StageKind::Speech);

        p.invalidate(StageKind::Speech);

        let err = p
            .commit_produced(StageKind::Speech, "c2.wav", Metadata::new(), &snapshot)
            .unwrap_err();
        assert!(err.to_string().contains("changed while it was executing"));
        assert!(p.query(StageKind::Speech).is_empty());
    }

    #[test]
    fn test_unrelated_invalidation_does_not_block_commit() {
        let mut p = Project::new("demo");
        let snapshot = p.upstream_snapshot(StageKind::Image);

        p.invalidate(StageKind::Music);

        assert!(p
            .commit_produced(StageKind::Image, "a.png", Metadata::new(), &snapshot)
            .is_ok());
    }

    #[test]
    fn test_generation_increments_per_recording() {
        let mut p = Project::new("demo");
        let a = record(&mut p, StageKind::Image, "a.png").artifact.unwrap();
        let b = record(&mut p, StageKind::Image, "a.png").artifact.unwrap();
        assert!(b.generation > a.generation);
    }
}
