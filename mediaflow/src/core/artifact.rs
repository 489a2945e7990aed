//! Record of an artifact currently held by a stage.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stage-specific metadata reported alongside an artifact
/// (e.g. `resolution` for images, `duration_seconds` for music).
pub type Metadata = HashMap<String, serde_json::Value>;

/// An artifact produced by a stage.
///
/// `path` is always relative to the project root. `generation` is the
/// project-wide counter value at the time the artifact was recorded; it
/// changes on every recording, even when the path is identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageArtifact {
    /// Root-relative, slash-separated artifact path.
    pub path: String,

    /// Stage-specific metadata.
    #[serde(default)]
    pub metadata: Metadata,

    /// Project generation at which this artifact was recorded.
    pub generation: u64,

    /// When the artifact was recorded (ISO 8601).
    pub produced_at: String,
}

impl StageArtifact {
    /// Creates a new artifact record.
    #[must_use]
    pub fn new(path: impl Into<String>, generation: u64) -> Self {
        Self {
            path: path.into(),
            metadata: HashMap::new(),
            generation,
            produced_at: crate::utils::iso_timestamp(),
        }
    }

    /// Replaces the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_creation() {
        let artifact = StageArtifact::new("data/generated_videos/b.mp4", 2);

        assert_eq!(artifact.path, "data/generated_videos/b.mp4");
        assert_eq!(artifact.generation, 2);
        assert!(artifact.metadata.is_empty());
        assert!(artifact.produced_at.contains('T'));
    }

    #[test]
    fn test_artifact_with_metadata() {
        let metadata = Metadata::from([
            ("duration_seconds".to_string(), serde_json::json!(30.0)),
            ("genre".to_string(), serde_json::json!("ambient")),
        ]);
        let artifact =
            StageArtifact::new("data/generated_audio/music/m.wav", 1).with_metadata(metadata);

        assert_eq!(artifact.metadata.len(), 2);
        assert_eq!(
            artifact.metadata.get("duration_seconds"),
            Some(&serde_json::json!(30.0))
        );
    }
}
