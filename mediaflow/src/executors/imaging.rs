//! Placeholder text-to-image executor.

use super::{
    new_artifact_path, store_artifact, wrong_inputs, ExecutionOutput, StageExecutor, StageInputs,
};
use crate::config::ImageConfig;
use crate::core::{Metadata, StageKind};
use crate::errors::ExecutionError;
use crate::store::ArtifactStore;
use async_trait::async_trait;
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::json;
use std::io::Cursor;
use tracing::debug;

/// Produces a solid-color PNG at the configured resolution.
#[derive(Debug, Clone)]
pub struct ImageExecutor {
    config: ImageConfig,
    output_dir: String,
}

impl ImageExecutor {
    /// Creates an executor writing under `output_dir`.
    #[must_use]
    pub fn new(config: ImageConfig, output_dir: impl Into<String>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    fn render_png(&self) -> Result<Vec<u8>, ExecutionError> {
        let color = Rgb(self.config.placeholder_color);
        let img = ImageBuffer::from_pixel(self.config.width, self.config.height, color);

        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).map_err(|e| {
            ExecutionError::new(StageKind::Image, format!("PNG encoding failed: {e}"))
        })?;
        Ok(bytes.into_inner())
    }
}

#[async_trait]
impl StageExecutor for ImageExecutor {
    fn stage(&self) -> StageKind {
        StageKind::Image
    }

    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let StageInputs::Image {
            prompt,
            negative_prompt,
        } = inputs
        else {
            return Err(wrong_inputs(StageKind::Image, inputs));
        };
        if prompt.trim().is_empty() {
            return Err(ExecutionError::invalid_input(
                StageKind::Image,
                "prompt must not be empty",
            ));
        }

        debug!(
            prompt = %prompt,
            resolution = %self.config.resolution(),
            "Rendering placeholder image"
        );
        let bytes = self.render_png()?;

        let mut metadata = Metadata::new();
        metadata.insert("prompt".to_string(), json!(prompt));
        metadata.insert("negative_prompt".to_string(), json!(negative_prompt));
        metadata.insert("resolution".to_string(), json!(self.config.resolution()));
        metadata.insert("upscaling_status".to_string(), json!("pending_integration"));
        metadata.insert("num_steps".to_string(), json!(self.config.num_steps));
        metadata.insert("guidance_scale".to_string(), json!(self.config.guidance_scale));
        metadata.insert("placeholder".to_string(), json!(true));

        let path = new_artifact_path(StageKind::Image, &self.output_dir, "png")?;
        store_artifact(StageKind::Image, store, &path, bytes, metadata).await
    }
}
