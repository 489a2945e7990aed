//! Stage executors.
//!
//! An executor turns [`StageInputs`] into one artifact written through an
//! [`ArtifactStore`]. Executors never touch pipeline state; the
//! [`Orchestrator`](crate::pipeline::Orchestrator) records their output.
//!
//! The built-in executors are placeholders that produce structurally valid
//! media (a solid-color PNG, silent WAV files, copied clips) so the whole
//! pipeline can be driven end to end without model backends.

mod audio;
mod imaging;
mod inputs;
mod video;

pub use audio::{MusicExecutor, SfxExecutor, SpeechExecutor};
pub use imaging::ImageExecutor;
pub use inputs::{ExportSettings, StageInputs};
pub use video::{AssemblyExecutor, LipSyncExecutor, VideoExecutor};

use crate::config::MediaflowConfig;
use crate::core::{Metadata, StageKind};
use crate::errors::ExecutionError;
use crate::paths::ProjectPath;
use crate::store::{sha256_hex, ArtifactStore, StoreError};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// What an executor reports after a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutput {
    /// Root-relative path of the produced artifact, as reported by the
    /// executor. It is validated again before it is recorded.
    pub artifact_path: String,
    /// Artifact metadata.
    pub metadata: Metadata,
}

impl ExecutionOutput {
    /// Creates an output.
    #[must_use]
    pub fn new(artifact_path: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            metadata,
        }
    }
}

/// Trait for stage executors.
#[async_trait]
pub trait StageExecutor: Send + Sync + Debug {
    /// Returns the stage this executor produces.
    fn stage(&self) -> StageKind;

    /// Runs the executor.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Inputs for [`stage`](Self::stage), with upstream paths
    ///   already validated and present in `store`
    /// * `store` - Where to read inputs and write the artifact
    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError>;
}

/// Returns one placeholder executor per stage.
#[must_use]
pub fn placeholder_executors(config: &MediaflowConfig) -> Vec<Arc<dyn StageExecutor>> {
    let dirs = &config.output_dirs;
    vec![
        Arc::new(ImageExecutor::new(config.image.clone(), &dirs.images)),
        Arc::new(VideoExecutor::new(config.video.clone(), &dirs.videos)),
        Arc::new(SpeechExecutor::new(config.audio.clone(), &dirs.speech)),
        Arc::new(MusicExecutor::new(config.audio.clone(), &dirs.music)),
        Arc::new(SfxExecutor::new(config.audio.clone(), &dirs.sfx)),
        Arc::new(LipSyncExecutor::new(&dirs.lipsync)),
        Arc::new(AssemblyExecutor::new(&dirs.final_videos)),
    ]
}

/// Builds a fresh `<stage>_<id>.<ext>` path under `dir`.
pub(crate) fn new_artifact_path(
    stage: StageKind,
    dir: &str,
    extension: &str,
) -> Result<ProjectPath, ExecutionError> {
    let file_name = crate::utils::artifact_file_name(stage, extension);
    ProjectPath::join(dir, &file_name)
        .map_err(|e| ExecutionError::new(stage, format!("invalid output path: {e}")))
}

/// Writes `bytes`, adds `sha256` and `size_bytes` to `metadata` and builds
/// the output.
pub(crate) async fn store_artifact(
    stage: StageKind,
    store: &dyn ArtifactStore,
    path: &ProjectPath,
    bytes: Vec<u8>,
    mut metadata: Metadata,
) -> Result<ExecutionOutput, ExecutionError> {
    metadata.insert("sha256".to_string(), sha256_hex(&bytes).into());
    metadata.insert("size_bytes".to_string(), bytes.len().into());

    let written = store
        .write(path, bytes)
        .await
        .map_err(|e| store_failure(stage, &e))?;
    Ok(ExecutionOutput::new(written, metadata))
}

/// Reads an input artifact named by an already validated path.
pub(crate) async fn read_input(
    stage: StageKind,
    store: &dyn ArtifactStore,
    name: &str,
    raw: Option<&str>,
) -> Result<(ProjectPath, Vec<u8>), ExecutionError> {
    let raw = raw.ok_or_else(|| ExecutionError::new(stage, format!("missing input '{name}'")))?;
    let path = ProjectPath::parse(raw)
        .map_err(|e| ExecutionError::new(stage, format!("invalid input '{name}': {e}")))?;
    let bytes = store
        .read(&path)
        .await
        .map_err(|e| store_failure(stage, &e))?;
    Ok((path, bytes))
}

pub(crate) fn store_failure(stage: StageKind, err: &StoreError) -> ExecutionError {
    ExecutionError::new(stage, format!("artifact store error: {err}"))
}

pub(crate) fn wrong_inputs(stage: StageKind, inputs: &StageInputs) -> ExecutionError {
    ExecutionError::new(
        stage,
        format!("received inputs for stage '{}'", inputs.stage()),
    )
}
