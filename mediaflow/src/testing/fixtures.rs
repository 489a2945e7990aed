//! Test fixtures for pipeline testing.

use std::sync::Arc;
use std::time::Duration;

use crate::config::MediaflowConfig;
use crate::errors::MediaflowError;
use crate::events::CollectingEventSink;
use crate::executors::{placeholder_executors, StageExecutor, StageInputs};
use crate::pipeline::{Orchestrator, Project, ProjectHandle, StageRun};
use crate::store::InMemoryArtifactStore;

/// One project wired to an in-memory store, the placeholder executors and a
/// collecting event sink.
#[derive(Debug, Clone)]
pub struct TestFixture {
    /// The project under test.
    pub project: ProjectHandle,
    /// The artifact store.
    pub store: Arc<InMemoryArtifactStore>,
    /// Collected pipeline events.
    pub events: Arc<CollectingEventSink>,
    /// The orchestrator.
    pub orchestrator: Orchestrator,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Creates a fixture with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&MediaflowConfig::default())
    }

    /// Creates a fixture using `config` for the placeholder executors.
    #[must_use]
    pub fn with_config(config: &MediaflowConfig) -> Self {
        let store = Arc::new(InMemoryArtifactStore::new());
        let events = Arc::new(CollectingEventSink::new());
        let orchestrator = Orchestrator::new(store.clone(), Duration::from_secs(5))
            .with_executors(placeholder_executors(config))
            .with_event_sink(events.clone());

        Self {
            project: ProjectHandle::new(Project::new("test-project")),
            store,
            events,
            orchestrator,
        }
    }

    /// Replaces the executor for its stage.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn StageExecutor>) -> Self {
        self.orchestrator = self.orchestrator.with_executor(executor);
        self
    }

    /// Runs one stage against the fixture project.
    pub async fn run(&self, inputs: StageInputs) -> Result<StageRun, MediaflowError> {
        self.orchestrator.run(&self.project, inputs).await
    }

    /// Returns a copy of the project state.
    #[must_use]
    pub fn snapshot(&self) -> Project {
        self.project.snapshot()
    }

    /// Image inputs for `prompt`.
    #[must_use]
    pub fn image(prompt: &str) -> StageInputs {
        StageInputs::Image {
            prompt: prompt.to_string(),
            negative_prompt: String::new(),
        }
    }

    /// Video inputs taking the image from the project.
    #[must_use]
    pub fn video() -> StageInputs {
        StageInputs::Video {
            image_path: None,
            motion_type: "static".to_string(),
        }
    }

    /// Speech inputs for `text`.
    #[must_use]
    pub fn speech(text: &str) -> StageInputs {
        StageInputs::Speech {
            text: text.to_string(),
            voice: "default".to_string(),
        }
    }

    /// One-second music inputs.
    #[must_use]
    pub fn music() -> StageInputs {
        StageInputs::Music {
            genre: "ambient".to_string(),
            mood: "calm".to_string(),
            duration_seconds: Some(1.0),
        }
    }

    /// Short sound effect inputs.
    #[must_use]
    pub fn sfx() -> StageInputs {
        StageInputs::Sfx {
            description: "whoosh".to_string(),
            duration_seconds: Some(0.5),
        }
    }

    /// Lip-sync inputs taking video and speech from the project.
    #[must_use]
    pub fn lipsync() -> StageInputs {
        StageInputs::LipSync {
            video_path: None,
            audio_path: None,
        }
    }

    /// Assembly inputs taking every track from the project.
    #[must_use]
    pub fn assembly() -> StageInputs {
        StageInputs::Assembly {
            base_video_path: None,
            speech_path: None,
            music_path: None,
            sfx_paths: Vec::new(),
            export_settings: crate::executors::ExportSettings::default(),
        }
    }
}
