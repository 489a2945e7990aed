//! Placeholder video executors: image-to-video, lip-sync and assembly.
//!
//! No codec is involved. The clip artifacts carry their source bytes
//! through unchanged and describe the intended media in metadata.

use super::{
    new_artifact_path, read_input, store_artifact, wrong_inputs, ExecutionOutput, StageExecutor,
    StageInputs,
};
use crate::config::VideoConfig;
use crate::core::{Metadata, StageKind};
use crate::errors::ExecutionError;
use crate::store::ArtifactStore;
use async_trait::async_trait;
use serde_json::json;

/// Wraps the input still frame into a one-second clip.
#[derive(Debug, Clone)]
pub struct VideoExecutor {
    config: VideoConfig,
    output_dir: String,
}

impl VideoExecutor {
    /// Creates an executor writing under `output_dir`.
    #[must_use]
    pub fn new(config: VideoConfig, output_dir: impl Into<String>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl StageExecutor for VideoExecutor {
    fn stage(&self) -> StageKind {
        StageKind::Video
    }

    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let StageInputs::Video {
            image_path,
            motion_type,
        } = inputs
        else {
            return Err(wrong_inputs(StageKind::Video, inputs));
        };

        let (source, frame) =
            read_input(StageKind::Video, store, "image_path", image_path.as_deref()).await?;

        let mut metadata = Metadata::new();
        metadata.insert("source_image".to_string(), json!(source));
        metadata.insert("motion_type".to_string(), json!(motion_type));
        metadata.insert("fps".to_string(), json!(self.config.fps));
        // One second of the repeated still frame.
        metadata.insert("num_frames".to_string(), json!(self.config.fps));
        metadata.insert("target_num_frames".to_string(), json!(self.config.num_frames));
        metadata.insert("duration_seconds".to_string(), json!(1.0));
        metadata.insert("placeholder".to_string(), json!(true));

        let path = new_artifact_path(StageKind::Video, &self.output_dir, &self.config.extension)?;
        store_artifact(StageKind::Video, store, &path, frame, metadata).await
    }
}

/// Passes the input video through unchanged.
#[derive(Debug, Clone)]
pub struct LipSyncExecutor {
    output_dir: String,
}

impl LipSyncExecutor {
    /// Creates an executor writing under `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl StageExecutor for LipSyncExecutor {
    fn stage(&self) -> StageKind {
        StageKind::LipSync
    }

    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let StageInputs::LipSync {
            video_path,
            audio_path,
        } = inputs
        else {
            return Err(wrong_inputs(StageKind::LipSync, inputs));
        };

        let (video, bytes) =
            read_input(StageKind::LipSync, store, "video_path", video_path.as_deref()).await?;
        let (audio, _) =
            read_input(StageKind::LipSync, store, "audio_path", audio_path.as_deref()).await?;

        let mut metadata = Metadata::new();
        metadata.insert("source_video".to_string(), json!(video));
        metadata.insert("source_audio".to_string(), json!(audio));
        metadata.insert("placeholder".to_string(), json!(true));

        let extension = video.extension().unwrap_or("mp4").to_string();
        let path = new_artifact_path(StageKind::LipSync, &self.output_dir, &extension)?;
        store_artifact(StageKind::LipSync, store, &path, bytes, metadata).await
    }
}

/// Exports the base video as the final clip, recording the mixed tracks.
#[derive(Debug, Clone)]
pub struct AssemblyExecutor {
    output_dir: String,
}

impl AssemblyExecutor {
    /// Creates an executor writing under `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl StageExecutor for AssemblyExecutor {
    fn stage(&self) -> StageKind {
        StageKind::Assembly
    }

    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let StageInputs::Assembly {
            base_video_path,
            speech_path,
            music_path,
            sfx_paths,
            export_settings,
        } = inputs
        else {
            return Err(wrong_inputs(StageKind::Assembly, inputs));
        };

        let (base, bytes) = read_input(
            StageKind::Assembly,
            store,
            "base_video_path",
            base_video_path.as_deref(),
        )
        .await?;
        let (speech, _) =
            read_input(StageKind::Assembly, store, "speech_path", speech_path.as_deref()).await?;

        let mut metadata = Metadata::new();
        metadata.insert("base_video".to_string(), json!(base));
        metadata.insert("speech".to_string(), json!(speech));
        metadata.insert("music".to_string(), json!(music_path));
        metadata.insert("sfx".to_string(), json!(sfx_paths));
        metadata.insert("export_settings".to_string(), json!(export_settings));
        metadata.insert("placeholder".to_string(), json!(true));

        let path =
            new_artifact_path(StageKind::Assembly, &self.output_dir, &export_settings.format)?;
        store_artifact(StageKind::Assembly, store, &path, bytes, metadata).await
    }
}
