//! Runs stage executors against a project.
//!
//! One [`Orchestrator::run`] call is the transaction "check, execute,
//! record". Executors run without holding the project lock; the upstream
//! generations seen at the start are re-checked when the result is
//! committed, so output built from replaced inputs is never recorded.

use super::project::Transition;
use super::registry::ProjectHandle;
use crate::config::MediaflowConfig;
use crate::core::{StageArtifact, StageKind};
use crate::errors::{ExecutionError, MediaflowError, NotFoundError, PreconditionError};
use crate::events::{
    EventSink, LoggingEventSink, NoOpEventSink, PROJECT_RESET, STAGE_FAILED, STAGE_INVALIDATED,
    STAGE_PRODUCED, STAGE_STARTED,
};
use crate::executors::{placeholder_executors, StageExecutor, StageInputs};
use crate::observability::ExecutionTimer;
use crate::paths::{ProjectPath, ProjectRoot};
use crate::store::{ArtifactStore, FsArtifactStore, StoreError};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// The result of a successful stage run.
#[derive(Debug, Clone, Serialize)]
pub struct StageRun {
    /// The stage that ran.
    pub stage: StageKind,
    /// The recorded artifact.
    pub artifact: StageArtifact,
    /// Downstream stages that were `Ready` and are now `Empty`.
    pub invalidated: Vec<StageKind>,
    /// Executor wall time in milliseconds.
    pub duration_ms: f64,
}

/// Drives stage executors and reports their output to projects.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    store: Arc<dyn ArtifactStore>,
    executors: HashMap<StageKind, Arc<dyn StageExecutor>>,
    events: Arc<dyn EventSink>,
    timeout: Duration,
}

impl Orchestrator {
    /// Creates an orchestrator with no executors.
    #[must_use]
    pub fn new(store: Arc<dyn ArtifactStore>, timeout: Duration) -> Self {
        Self {
            store,
            executors: HashMap::new(),
            events: Arc::new(NoOpEventSink),
            timeout,
        }
    }

    /// Creates an orchestrator over a filesystem store at the configured
    /// root, with the placeholder executors and a logging event sink.
    #[must_use]
    pub fn from_config(config: &MediaflowConfig) -> Self {
        let store = FsArtifactStore::new(ProjectRoot::new(&config.project_root));
        Self::new(Arc::new(store), config.executor_timeout())
            .with_executors(placeholder_executors(config))
            .with_event_sink(Arc::new(LoggingEventSink::default()))
    }

    /// Registers an executor, replacing any previous one for its stage.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn StageExecutor>) -> Self {
        self.executors.insert(executor.stage(), executor);
        self
    }

    /// Registers several executors.
    #[must_use]
    pub fn with_executors(
        mut self,
        executors: impl IntoIterator<Item = Arc<dyn StageExecutor>>,
    ) -> Self {
        for executor in executors {
            self.executors.insert(executor.stage(), executor);
        }
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the artifact store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Returns the executor timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs the executor for `inputs.stage()` and records its artifact.
    ///
    /// On any error the project state is unchanged.
    ///
    /// # Errors
    ///
    /// - `PathEscape` when an input or returned path leaves the project root
    /// - `Precondition` when a required upstream stage is not `Ready`, or an
    ///   upstream artifact was replaced while the executor ran
    /// - `NotFound` when an input artifact is missing from the store
    /// - `Execution` when the executor fails or times out
    #[instrument(skip_all, fields(project = %project.id(), stage = %inputs.stage()))]
    pub async fn run(
        &self,
        project: &ProjectHandle,
        inputs: StageInputs,
    ) -> Result<StageRun, MediaflowError> {
        let stage = inputs.stage();
        let project_id = project.id();
        let executor = self
            .executors
            .get(&stage)
            .cloned()
            .ok_or_else(|| ExecutionError::new(stage, "no executor is registered for this stage"))?;

        let state = project.snapshot();
        let inputs = inputs.with_defaults(&state);
        let upstream = state.upstream_snapshot(stage);

        let mut input_paths = Vec::new();
        for (name, raw) in inputs.input_paths() {
            input_paths.push((name, ProjectPath::parse(raw)?));
        }

        let missing = state.unsatisfied_dependencies(stage);
        if !missing.is_empty() {
            return Err(PreconditionError::dependencies_unsatisfied(stage, missing).into());
        }

        for (name, path) in &input_paths {
            self.ensure_exists(stage, name, path).await?;
        }

        self.events
            .emit(STAGE_STARTED, Some(json!({"project": project_id, "stage": stage})))
            .await;
        let timer = ExecutionTimer::start(stage);

        let execution = executor.execute(&inputs, self.store.as_ref());
        let result = tokio::time::timeout(self.timeout, execution).await;
        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                timer.finish(false);
                return Err(self.fail(&project_id, err.into()).await);
            }
            Err(_) => {
                timer.finish(false);
                let err = ExecutionError::timeout(stage, self.timeout.as_secs_f64());
                return Err(self.fail(&project_id, err.into()).await);
            }
        };
        let duration_ms = timer.finish(true);

        let committed = ProjectPath::parse(&output.artifact_path)
            .map_err(MediaflowError::from)
            .and_then(|path| project.commit_produced(stage, path, output.metadata, &upstream));
        let transition = match committed {
            Ok(t) => t,
            Err(err) => return Err(self.fail(&project_id, err).await),
        };

        let Transition {
            artifact,
            invalidated,
            ..
        } = transition;
        let artifact = artifact.ok_or_else(|| MediaflowError::InvalidArtifact {
            stage,
            reason: "no artifact was recorded".to_string(),
        })?;

        info!(path = %artifact.path, duration_ms, ?invalidated, "Stage produced");
        self.events
            .emit(
                STAGE_PRODUCED,
                Some(json!({
                    "project": project_id,
                    "stage": stage,
                    "path": artifact.path,
                    "duration_ms": duration_ms,
                    "invalidated": invalidated,
                })),
            )
            .await;
        self.emit_invalidated(&project_id, stage, &invalidated).await;

        Ok(StageRun {
            stage,
            artifact,
            invalidated,
            duration_ms,
        })
    }

    /// Forces `stage` to `Empty` and reports what was invalidated.
    pub async fn invalidate(&self, project: &ProjectHandle, stage: StageKind) -> Transition {
        let transition = project.invalidate(stage);
        let project_id = project.id();

        self.events
            .emit(
                STAGE_INVALIDATED,
                Some(json!({"project": project_id, "stage": stage, "cause": "request"})),
            )
            .await;
        self.emit_invalidated(&project_id, stage, &transition.invalidated)
            .await;
        transition
    }

    /// Sets every stage of the project to `Empty`.
    pub async fn reset(&self, project: &ProjectHandle) {
        project.reset();
        self.events
            .emit(PROJECT_RESET, Some(json!({"project": project.id()})))
            .await;
    }

    async fn ensure_exists(
        &self,
        stage: StageKind,
        name: &str,
        path: &ProjectPath,
    ) -> Result<(), MediaflowError> {
        match self.store.exists(path).await {
            Ok(true) => Ok(()),
            Ok(false) | Err(StoreError::NotFound(_)) => {
                Err(NotFoundError::new(stage, name, path.as_str()).into())
            }
            Err(StoreError::PathEscape(e)) => Err(e.into()),
            Err(StoreError::Io { source, .. }) => Err(source.into()),
        }
    }

    async fn emit_invalidated(&self, project_id: &str, cause: StageKind, stages: &[StageKind]) {
        for stage in stages {
            self.events
                .emit(
                    STAGE_INVALIDATED,
                    Some(json!({"project": project_id, "stage": stage, "cause": cause})),
                )
                .await;
        }
    }

    async fn fail(&self, project_id: &str, err: MediaflowError) -> MediaflowError {
        warn!(error = %err, kind = err.kind(), "Stage failed; project state unchanged");
        self.events
            .emit(
                STAGE_FAILED,
                Some(json!({"project": project_id, "error": err.to_dict()})),
            )
            .await;
        err
    }
}
