//! Placeholder audio executors: speech, music and sound effects.
//!
//! All three write silent 16-bit PCM WAV files whose length follows the
//! request, so downstream stages see tracks of realistic duration.

use super::{
    new_artifact_path, store_artifact, wrong_inputs, ExecutionOutput, StageExecutor, StageInputs,
};
use crate::config::AudioConfig;
use crate::core::{Metadata, StageKind};
use crate::errors::ExecutionError;
use crate::store::ArtifactStore;
use async_trait::async_trait;
use serde_json::json;
use std::io::Cursor;

/// Encodes `duration_seconds` of silence as WAV.
fn silent_wav(
    stage: StageKind,
    config: &AudioConfig,
    duration_seconds: f64,
) -> Result<Vec<u8>, ExecutionError> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let frames = (duration_seconds * f64::from(config.sample_rate)).round() as u64;
    let samples = frames * u64::from(config.channels);

    let wav_error =
        |e: hound::Error| ExecutionError::new(stage, format!("WAV encoding failed: {e}"));
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
    for _ in 0..samples {
        writer.write_sample(0i16).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    Ok(cursor.into_inner())
}

/// Validates a requested duration against the configured bound.
fn checked_duration(
    stage: StageKind,
    config: &AudioConfig,
    requested: Option<f64>,
    default: f64,
) -> Result<f64, ExecutionError> {
    let duration = requested.unwrap_or(default);
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ExecutionError::invalid_input(stage, format!("invalid duration {duration}s")));
    }
    if duration > config.max_duration_seconds {
        return Err(ExecutionError::invalid_input(
            stage,
            format!(
                "duration {duration}s exceeds the limit of {}s",
                config.max_duration_seconds
            ),
        ));
    }
    Ok(duration)
}

fn audio_metadata(config: &AudioConfig, duration_seconds: f64) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("duration_seconds".to_string(), json!(duration_seconds));
    metadata.insert("sample_rate".to_string(), json!(config.sample_rate));
    metadata.insert("channels".to_string(), json!(config.channels));
    metadata.insert("placeholder".to_string(), json!(true));
    metadata
}

/// Text-to-speech placeholder.
///
/// The track length is estimated from the word count of the text.
#[derive(Debug, Clone)]
pub struct SpeechExecutor {
    config: AudioConfig,
    output_dir: String,
}

impl SpeechExecutor {
    /// Creates an executor writing under `output_dir`.
    #[must_use]
    pub fn new(config: AudioConfig, output_dir: impl Into<String>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    /// Estimated speaking time for `text`.
    #[must_use]
    pub fn estimate_duration(&self, text: &str) -> f64 {
        let words = text.split_whitespace().count().max(1);
        words as f64 * self.config.speech_seconds_per_word
    }
}

#[async_trait]
impl StageExecutor for SpeechExecutor {
    fn stage(&self) -> StageKind {
        StageKind::Speech
    }

    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let StageInputs::Speech { text, voice } = inputs else {
            return Err(wrong_inputs(StageKind::Speech, inputs));
        };
        if text.trim().is_empty() {
            return Err(ExecutionError::invalid_input(
                StageKind::Speech,
                "text must not be empty",
            ));
        }

        let estimate = self.estimate_duration(text);
        let duration = checked_duration(StageKind::Speech, &self.config, Some(estimate), estimate)?;
        let bytes = silent_wav(StageKind::Speech, &self.config, duration)?;

        let mut metadata = audio_metadata(&self.config, duration);
        metadata.insert("voice".to_string(), json!(voice));
        metadata.insert("word_count".to_string(), json!(text.split_whitespace().count()));

        let path = new_artifact_path(StageKind::Speech, &self.output_dir, "wav")?;
        store_artifact(StageKind::Speech, store, &path, bytes, metadata).await
    }
}

/// Background music placeholder.
#[derive(Debug, Clone)]
pub struct MusicExecutor {
    config: AudioConfig,
    output_dir: String,
}

impl MusicExecutor {
    /// Creates an executor writing under `output_dir`.
    #[must_use]
    pub fn new(config: AudioConfig, output_dir: impl Into<String>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl StageExecutor for MusicExecutor {
    fn stage(&self) -> StageKind {
        StageKind::Music
    }

    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let StageInputs::Music {
            genre,
            mood,
            duration_seconds,
        } = inputs
        else {
            return Err(wrong_inputs(StageKind::Music, inputs));
        };

        let duration = checked_duration(
            StageKind::Music,
            &self.config,
            *duration_seconds,
            self.config.default_music_seconds,
        )?;
        let bytes = silent_wav(StageKind::Music, &self.config, duration)?;

        let mut metadata = audio_metadata(&self.config, duration);
        metadata.insert("genre".to_string(), json!(genre));
        metadata.insert("mood".to_string(), json!(mood));

        let path = new_artifact_path(StageKind::Music, &self.output_dir, "wav")?;
        store_artifact(StageKind::Music, store, &path, bytes, metadata).await
    }
}

/// Sound effect placeholder.
#[derive(Debug, Clone)]
pub struct SfxExecutor {
    config: AudioConfig,
    output_dir: String,
}

impl SfxExecutor {
    /// Creates an executor writing under `output_dir`.
    #[must_use]
    pub fn new(config: AudioConfig, output_dir: impl Into<String>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl StageExecutor for SfxExecutor {
    fn stage(&self) -> StageKind {
        StageKind::Sfx
    }

    async fn execute(
        &self,
        inputs: &StageInputs,
        store: &dyn ArtifactStore,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let StageInputs::Sfx {
            description,
            duration_seconds,
        } = inputs
        else {
            return Err(wrong_inputs(StageKind::Sfx, inputs));
        };
        if description.trim().is_empty() {
            return Err(ExecutionError::invalid_input(
                StageKind::Sfx,
                "description must not be empty",
            ));
        }

        let duration = checked_duration(
            StageKind::Sfx,
            &self.config,
            *duration_seconds,
            self.config.default_sfx_seconds,
        )?;
        let bytes = silent_wav(StageKind::Sfx, &self.config, duration)?;

        let mut metadata = audio_metadata(&self.config, duration);
        metadata.insert("description".to_string(), json!(description));

        let path = new_artifact_path(StageKind::Sfx, &self.output_dir, "wav")?;
        store_artifact(StageKind::Sfx, store, &path, bytes, metadata).await
    }
}
