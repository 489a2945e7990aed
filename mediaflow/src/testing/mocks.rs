//! Mock stage executors for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::core::{Metadata, StageKind};
use crate::errors::ExecutionError;
use crate::executors::{ExecutionOutput, StageExecutor, StageInputs};
use crate::paths::ProjectPath;
use crate::store::ArtifactStore;

/// A mock executor that records calls and writes a small artifact.
///
/// Each call writes `mock/<stage>_<n>.bin`, unless a fixed artifact path was
/// configured, in which case that path is returned without writing.
#[derive(Debug)]
pub struct MockExecutor {
    stage: StageKind,
    artifact_path: Option<String>,
    metadata: Metadata,
    calls: Mutex<Vec<StageInputs>>,
}

impl MockExecutor {
    /// Creates a mock for `stage`.
    #[must_use]
    pub fn new(stage: StageKind) -> Self {
        Self {
            stage,
            artifact_path: None,
            metadata: Metadata::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns `path` from every call instead of writing an artifact.
    #[must_use]
    pub fn with_artifact_path(mut self, path: impl Into<String>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }

    /// Sets the metadata to report.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns the number of times the executor was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the inputs of each call.
    #[must_use]
    pub fn recorded_inputs(&self) -> Vec<StageInputs> {
        self.calls.lock().clone()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl StageExecutor for MockExecutor {
    fn stage(&self) -> StageKind {
        self.stage
    }

    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let call = {
            let mut calls = self.calls.lock();
            calls.push(inputs.clone());
            calls.len()
        };

        if let Some(path) = &self.artifact_path {
            return Ok(ExecutionOutput::new(path.clone(), self.metadata.clone()));
        }

        let path = ProjectPath::parse(&format!("mock/{}_{call}.bin", self.stage))
            .map_err(|e| ExecutionError::new(self.stage, e.to_string()))?;
        let written = store
            .write(&path, format!("{}:{call}", self.stage).into_bytes())
            .await
            .map_err(|e| ExecutionError::new(self.stage, e.to_string()))?;
        Ok(ExecutionOutput::new(written, self.metadata.clone()))
    }
}

/// An executor that always fails.
#[derive(Debug)]
pub struct FailingExecutor {
    stage: StageKind,
    reason: String,
}

impl FailingExecutor {
    /// Creates a failing executor for `stage`.
    #[must_use]
    pub fn new(stage: StageKind, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl StageExecutor for FailingExecutor {
    fn stage(&self) -> StageKind {
        self.stage
    }

    async fn execute(
        &self,
        _inputs: &StageInputs,
        _store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        Err(ExecutionError::new(self.stage, self.reason.clone()))
    }
}

/// An executor that sleeps before delegating to a [`MockExecutor`].
#[derive(Debug)]
pub struct SlowExecutor {
    delay: Duration,
    inner: MockExecutor,
}

impl SlowExecutor {
    /// Creates a slow executor for `stage`.
    #[must_use]
    pub fn new(stage: StageKind, delay: Duration) -> Self {
        Self {
            delay,
            inner: MockExecutor::new(stage),
        }
    }

    /// Returns the number of calls that started.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }
}

#[async_trait]
impl StageExecutor for SlowExecutor {
    fn stage(&self) -> StageKind {
        self.inner.stage()
    }

    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        tokio::time::sleep(self.delay).await;
        self.inner.execute(inputs, store).await
    }
}
