//! End-to-end pipeline tests driven through the orchestrator.

#[cfg(test)]
mod tests {
    use crate::core::StageKind;
    use crate::errors::MediaflowError;
    use crate::events::{STAGE_INVALIDATED, STAGE_PRODUCED};
    use crate::executors::StageInputs;
    use crate::testing::{
        assert_executable, assert_not_executable, assert_stage_empty, assert_stage_ready,
        FailingExecutor, TestFixture,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    async fn produce_all(fixture: &TestFixture) {
        fixture.run(TestFixture::image("a red bicycle")).await.unwrap();
        fixture.run(TestFixture::video()).await.unwrap();
        fixture.run(TestFixture::speech("hello there world")).await.unwrap();
        fixture.run(TestFixture::music()).await.unwrap();
        fixture.run(TestFixture::sfx()).await.unwrap();
        fixture.run(TestFixture::lipsync()).await.unwrap();
        fixture.run(TestFixture::assembly()).await.unwrap();
    }

    #[tokio::test]
    async fn test_full_scenario_leaves_every_stage_ready() {
        let fixture = TestFixture::new();
        produce_all(&fixture).await;

        let project = fixture.snapshot();
        for stage in StageKind::ALL {
            assert_stage_ready(&project, stage);
        }

        let assembly = project.query(StageKind::Assembly).artifact().unwrap();
        assert!(assembly.path.starts_with("data/final_videos/assembly_"));
        assert_eq!(
            assembly.metadata["base_video"],
            project.query(StageKind::LipSync).artifact_path().unwrap()
        );
        assert_eq!(
            assembly.metadata["music"],
            project.query(StageKind::Music).artifact_path().unwrap()
        );
        assert_eq!(fixture.store.len(), 7);
    }

    #[tokio::test]
    async fn test_assembly_without_optional_tracks() {
        let fixture = TestFixture::new();
        fixture.run(TestFixture::image("a")).await.unwrap();
        fixture.run(TestFixture::video()).await.unwrap();
        fixture.run(TestFixture::speech("hi")).await.unwrap();
        fixture.run(TestFixture::lipsync()).await.unwrap();

        let run = fixture.run(TestFixture::assembly()).await.unwrap();
        assert_eq!(run.artifact.metadata["music"], serde_json::Value::Null);
        assert_eq!(run.artifact.metadata["sfx"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_regenerating_image_invalidates_visual_chain() {
        let fixture = TestFixture::new();
        produce_all(&fixture).await;
        fixture.events.clear();

        let run = fixture.run(TestFixture::image("a blue bicycle")).await.unwrap();

        assert_eq!(
            run.invalidated,
            vec![StageKind::Video, StageKind::LipSync, StageKind::Assembly]
        );
        let project = fixture.snapshot();
        for stage in [StageKind::Video, StageKind::LipSync, StageKind::Assembly] {
            assert_stage_empty(&project, stage);
        }
        for stage in [StageKind::Image, StageKind::Speech, StageKind::Music, StageKind::Sfx] {
            assert_stage_ready(&project, stage);
        }
        assert_eq!(fixture.events.events_of_type(STAGE_INVALIDATED).len(), 3);
        assert_eq!(fixture.events.events_of_type(STAGE_PRODUCED).len(), 1);
    }

    #[tokio::test]
    async fn test_regenerating_music_invalidates_only_assembly() {
        let fixture = TestFixture::new();
        produce_all(&fixture).await;

        let run = fixture.run(TestFixture::music()).await.unwrap();

        assert_eq!(run.invalidated, vec![StageKind::Assembly]);
        let project = fixture.snapshot();
        assert_stage_ready(&project, StageKind::LipSync);
        assert_stage_ready(&project, StageKind::Speech);
        assert_executable(&project, StageKind::Assembly);
    }

    #[tokio::test]
    async fn test_regenerating_speech_keeps_video() {
        let fixture = TestFixture::new();
        produce_all(&fixture).await;

        let run = fixture.run(TestFixture::speech("new lines")).await.unwrap();

        assert_eq!(run.invalidated, vec![StageKind::LipSync, StageKind::Assembly]);
        let project = fixture.snapshot();
        assert_stage_ready(&project, StageKind::Video);
        assert_executable(&project, StageKind::LipSync);
        assert_not_executable(&project, StageKind::Assembly);
    }

    #[tokio::test]
    async fn test_failed_stage_keeps_downstream() {
        let fixture = TestFixture::new();
        produce_all(&fixture).await;
        let before = fixture.snapshot();

        let fixture =
            fixture.with_executor(Arc::new(FailingExecutor::new(StageKind::Image, "gpu lost")));
        let err = fixture.run(TestFixture::image("again")).await.unwrap_err();

        assert!(matches!(err, MediaflowError::Execution(_)));
        let after = fixture.snapshot();
        assert_eq!(after.generation(), before.generation());
        for stage in StageKind::ALL {
            assert_stage_ready(&after, stage);
        }
    }

    #[tokio::test]
    async fn test_rejected_lipsync_input_keeps_state() {
        let fixture = TestFixture::new();
        produce_all(&fixture).await;

        let inputs = StageInputs::LipSync {
            video_path: Some("data/../../../etc/passwd".to_string()),
            audio_path: None,
        };
        let err = fixture.run(inputs).await.unwrap_err();

        assert!(matches!(err, MediaflowError::PathEscape(_)));
        assert_stage_ready(&fixture.snapshot(), StageKind::Assembly);
    }
}
