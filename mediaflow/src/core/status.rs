//! Stage kind and stage state enums.

use super::StageArtifact;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The artifact-producing steps of the media pipeline.
///
/// The set is fixed; it is not extensible at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Text-to-image generation.
    Image,
    /// Image-to-video generation.
    Video,
    /// Text-to-speech generation.
    Speech,
    /// Background music generation.
    Music,
    /// Sound effect generation.
    Sfx,
    /// Lip-syncing the video to the speech track.
    #[serde(rename = "lipsync")]
    LipSync,
    /// Final assembly of the exported video.
    Assembly,
}

impl StageKind {
    /// Every stage, in pipeline order.
    pub const ALL: [Self; 7] = [
        Self::Image,
        Self::Video,
        Self::Speech,
        Self::Music,
        Self::Sfx,
        Self::LipSync,
        Self::Assembly,
    ];

    /// Returns the lowercase name used in paths, events and URLs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Speech => "speech",
            Self::Music => "music",
            Self::Sfx => "sfx",
            Self::LipSync => "lipsync",
            Self::Assembly => "assembly",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown stage name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown stage '{0}'")]
pub struct UnknownStageError(pub String);

impl FromStr for StageKind {
    type Err = UnknownStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "speech" => Ok(Self::Speech),
            "music" => Ok(Self::Music),
            "sfx" => Ok(Self::Sfx),
            "lipsync" | "lip_sync" => Ok(Self::LipSync),
            "assembly" => Ok(Self::Assembly),
            _ => Err(UnknownStageError(s.to_string())),
        }
    }
}

/// The current state of one stage within a project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageState {
    /// The stage has never produced an artifact, or was invalidated.
    #[default]
    Empty,
    /// The stage has a current artifact.
    Ready(StageArtifact),
}

impl StageState {
    /// Returns true if the stage holds a current artifact.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns true if the stage is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the current artifact, if any.
    #[must_use]
    pub const fn artifact(&self) -> Option<&StageArtifact> {
        match self {
            Self::Ready(artifact) => Some(artifact),
            Self::Empty => None,
        }
    }

    /// Returns the root-relative artifact path, if any.
    #[must_use]
    pub fn artifact_path(&self) -> Option<&str> {
        self.artifact().map(|a| a.path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_display() {
        assert_eq!(StageKind::Image.to_string(), "image");
        assert_eq!(StageKind::LipSync.to_string(), "lipsync");
        assert_eq!(StageKind::Assembly.to_string(), "assembly");
    }

    #[test]
    fn test_stage_kind_parse() {
        assert_eq!("Video".parse::<StageKind>().unwrap(), StageKind::Video);
        assert_eq!("lip_sync".parse::<StageKind>().unwrap(), StageKind::LipSync);
        assert!("subtitles".parse::<StageKind>().is_err());
    }

    #[test]
    fn test_stage_kind_serialize() {
        let json = serde_json::to_string(&StageKind::LipSync).unwrap();
        assert_eq!(json, r#""lipsync""#);

        let kind: StageKind = serde_json::from_str(r#""sfx""#).unwrap();
        assert_eq!(kind, StageKind::Sfx);
    }

    #[test]
    fn test_display_and_parse_agree() {
        for stage in StageKind::ALL {
            assert_eq!(stage.to_string().parse::<StageKind>().unwrap(), stage);
        }
    }

    #[test]
    fn test_stage_state_serialize() {
        let empty = serde_json::to_value(StageState::Empty).unwrap();
        assert_eq!(empty, serde_json::json!({"status": "empty"}));

        let ready = StageState::Ready(StageArtifact::new("data/generated_images/a.png", 3));
        let value = serde_json::to_value(&ready).unwrap();
        assert_eq!(value["status"], "ready");
        assert_eq!(value["path"], "data/generated_images/a.png");

        let back: StageState = serde_json::from_value(value).unwrap();
        assert_eq!(back.artifact_path(), Some("data/generated_images/a.png"));
    }
}
