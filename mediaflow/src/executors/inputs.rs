//! Typed, stage-specific executor inputs.
//!
//! Paths in inputs are untrusted strings. The orchestrator validates them
//! with [`ProjectPath::parse`](crate::paths::ProjectPath::parse) before any
//! store access, and fills omitted upstream paths from the project state.

use crate::core::StageKind;
use crate::pipeline::Project;
use serde::{Deserialize, Serialize};

fn default_motion_type() -> String {
    "static".to_string()
}

fn default_voice() -> String {
    "default".to_string()
}

/// Output settings for the final assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Output resolution as `WIDTHxHEIGHT`.
    #[serde(default = "default_export_resolution")]
    pub resolution: String,
    /// Container format.
    #[serde(default = "default_export_format")]
    pub format: String,
    /// Encoder quality preset.
    #[serde(default = "default_export_quality")]
    pub quality: String,
}

fn default_export_resolution() -> String {
    "512x512".to_string()
}

fn default_export_format() -> String {
    "mp4".to_string()
}

fn default_export_quality() -> String {
    "high".to_string()
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            resolution: default_export_resolution(),
            format: default_export_format(),
            quality: default_export_quality(),
        }
    }
}

/// Inputs for one stage execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageInputs {
    /// Text-to-image.
    Image {
        /// What to draw.
        prompt: String,
        /// What to avoid.
        #[serde(default)]
        negative_prompt: String,
    },
    /// Image-to-video.
    Video {
        /// Source image; defaults to the project's image artifact.
        #[serde(default)]
        image_path: Option<String>,
        /// Camera or subject motion preset.
        #[serde(default = "default_motion_type")]
        motion_type: String,
    },
    /// Text-to-speech.
    Speech {
        /// Narration text.
        text: String,
        /// Voice preset.
        #[serde(default = "default_voice")]
        voice: String,
    },
    /// Background music.
    Music {
        /// Genre description.
        #[serde(default)]
        genre: String,
        /// Mood description.
        #[serde(default)]
        mood: String,
        /// Requested length; the configured default when omitted.
        #[serde(default)]
        duration_seconds: Option<f64>,
    },
    /// Sound effect.
    Sfx {
        /// What the effect sounds like.
        description: String,
        /// Requested length; the configured default when omitted.
        #[serde(default)]
        duration_seconds: Option<f64>,
    },
    /// Lip-sync of speech onto video.
    #[serde(rename = "lipsync", alias = "lip_sync")]
    LipSync {
        /// Video to animate; defaults to the project's video artifact.
        #[serde(default)]
        video_path: Option<String>,
        /// Speech track; defaults to the project's speech artifact.
        #[serde(default)]
        audio_path: Option<String>,
    },
    /// Final mix and export.
    Assembly {
        /// Lip-synced video; defaults to the project's lipsync artifact.
        #[serde(default)]
        base_video_path: Option<String>,
        /// Speech track; defaults to the project's speech artifact.
        #[serde(default)]
        speech_path: Option<String>,
        /// Music track; defaults to the music artifact when one is ready.
        #[serde(default)]
        music_path: Option<String>,
        /// Effect tracks; defaults to the sfx artifact when one is ready.
        #[serde(default)]
        sfx_paths: Vec<String>,
        /// Output settings.
        #[serde(default)]
        export_settings: ExportSettings,
    },
}

impl StageInputs {
    /// Returns the stage these inputs are for.
    #[must_use]
    pub const fn stage(&self) -> StageKind {
        match self {
            Self::Image { .. } => StageKind::Image,
            Self::Video { .. } => StageKind::Video,
            Self::Speech { .. } => StageKind::Speech,
            Self::Music { .. } => StageKind::Music,
            Self::Sfx { .. } => StageKind::Sfx,
            Self::LipSync { .. } => StageKind::LipSync,
            Self::Assembly { .. } => StageKind::Assembly,
        }
    }

    /// Fills omitted input paths from the project's `Ready` artifacts.
    ///
    /// Paths given explicitly are kept as-is.
    #[must_use]
    pub fn with_defaults(mut self, project: &Project) -> Self {
        let ready = |stage: StageKind| project.query(stage).artifact_path().map(str::to_string);

        match &mut self {
            Self::Video { image_path, .. } => {
                fill(image_path, || ready(StageKind::Image));
            }
            Self::LipSync {
                video_path,
                audio_path,
            } => {
                fill(video_path, || ready(StageKind::Video));
                fill(audio_path, || ready(StageKind::Speech));
            }
            Self::Assembly {
                base_video_path,
                speech_path,
                music_path,
                sfx_paths,
                ..
            } => {
                fill(base_video_path, || ready(StageKind::LipSync));
                fill(speech_path, || ready(StageKind::Speech));
                fill(music_path, || ready(StageKind::Music));
                if sfx_paths.is_empty() {
                    sfx_paths.extend(ready(StageKind::Sfx));
                }
            }
            Self::Image { .. } | Self::Speech { .. } | Self::Music { .. } | Self::Sfx { .. } => {}
        }
        self
    }

    /// Returns `(input name, path)` for every input path present.
    #[must_use]
    pub fn input_paths(&self) -> Vec<(&'static str, &str)> {
        let mut paths = Vec::new();
        match self {
            Self::Video { image_path, .. } => push(&mut paths, "image_path", image_path),
            Self::LipSync {
                video_path,
                audio_path,
            } => {
                push(&mut paths, "video_path", video_path);
                push(&mut paths, "audio_path", audio_path);
            }
            Self::Assembly {
                base_video_path,
                speech_path,
                music_path,
                sfx_paths,
                ..
            } => {
                push(&mut paths, "base_video_path", base_video_path);
                push(&mut paths, "speech_path", speech_path);
                push(&mut paths, "music_path", music_path);
                paths.extend(sfx_paths.iter().map(|p| ("sfx_paths", p.as_str())));
            }
            Self::Image { .. } | Self::Speech { .. } | Self::Music { .. } | Self::Sfx { .. } => {}
        }
        paths
    }
}

fn fill(slot: &mut Option<String>, default: impl FnOnce() -> Option<String>) {
    if slot.is_none() {
        *slot = default();
    }
}

fn push<'a>(
    paths: &mut Vec<(&'static str, &'a str)>,
    name: &'static str,
    value: &'a Option<String>,
) {
    if let Some(p) = value {
        paths.push((name, p.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Metadata;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stage_tag() {
        let inputs: StageInputs =
            serde_json::from_str(r#"{"stage": "lipsync", "video_path": "data/v.mp4"}"#).unwrap();
        assert_eq!(inputs.stage(), StageKind::LipSync);

        let inputs: StageInputs =
            serde_json::from_str(r#"{"stage": "image", "prompt": "a cat"}"#).unwrap();
        assert_eq!(
            inputs,
            StageInputs::Image {
                prompt: "a cat".to_string(),
                negative_prompt: String::new(),
            }
        );
    }

    #[test]
    fn test_defaults_filled_from_project() {
        let mut project = Project::new("p");
        project
            .record_produced(StageKind::Image, "data/generated_images/a.png", Metadata::new())
            .unwrap();

        let inputs = StageInputs::Video {
            image_path: None,
            motion_type: "pan".to_string(),
        }
        .with_defaults(&project);

        assert_eq!(inputs.input_paths(), vec![("image_path", "data/generated_images/a.png")]);
    }

    #[test]
    fn test_explicit_paths_kept() {
        let mut project = Project::new("p");
        project
            .record_produced(StageKind::Speech, "data/s.wav", Metadata::new())
            .unwrap();

        let inputs = StageInputs::LipSync {
            video_path: Some("data/other.mp4".to_string()),
            audio_path: Some("data/mine.wav".to_string()),
        }
        .with_defaults(&project);

        assert_eq!(
            inputs.input_paths(),
            vec![("video_path", "data/other.mp4"), ("audio_path", "data/mine.wav")]
        );
    }

    #[test]
    fn test_assembly_optional_tracks() {
        let mut project = Project::new("p");
        project.record_produced(StageKind::Speech, "s.wav", Metadata::new()).unwrap();
        project.record_produced(StageKind::Sfx, "x.wav", Metadata::new()).unwrap();

        let inputs = StageInputs::Assembly {
            base_video_path: None,
            speech_path: None,
            music_path: None,
            sfx_paths: Vec::new(),
            export_settings: ExportSettings::default(),
        }
        .with_defaults(&project);

        assert_eq!(
            inputs.input_paths(),
            vec![("speech_path", "s.wav"), ("sfx_paths", "x.wav")]
        );
    }
}
