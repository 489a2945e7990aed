//! One endpoint per pipeline stage.
//!
//! Request bodies carry the stage inputs without the `stage` tag; the route
//! decides the stage. Omitted upstream paths are taken from the project.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    response::Json,
    routing::post,
    Router,
};
use mediaflow::core::StageKind;
use mediaflow::errors::MediaflowError;
use mediaflow::executors::StageInputs;
use mediaflow::pipeline::StageRun;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::error::{json_body, ApiError};
use crate::state::AppState;

fn success_message(stage: StageKind) -> &'static str {
    match stage {
        StageKind::Image => "Image generated successfully (placeholder)",
        StageKind::Video => "Video generated successfully (placeholder)",
        StageKind::Speech => "Speech generated successfully (placeholder)",
        StageKind::Music => "Music generated successfully (placeholder)",
        StageKind::Sfx => "Sound effect generated successfully (placeholder)",
        StageKind::LipSync => "Lip-sync completed successfully (placeholder)",
        StageKind::Assembly => "Final video assembled successfully (placeholder)",
    }
}

type JsonBody = Result<Json<Value>, JsonRejection>;

/// Tags a request body with `stage` and decodes it. A `null` body counts as
/// an empty object.
fn parse_inputs(stage: StageKind, body: Value) -> Result<StageInputs, MediaflowError> {
    let mut fields = match body {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(MediaflowError::Serialization(format!(
                "expected a JSON object, got {other}"
            )))
        }
    };
    fields.insert("stage".to_string(), json!(stage));
    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn run_view(run: &StageRun) -> Value {
    json!({
        "message": success_message(run.stage),
        "stage": run.stage,
        "artifact_path": run.artifact.path,
        "metadata": run.artifact.metadata,
        "invalidated": run.invalidated,
    })
}

async fn run_stage(
    state: &AppState,
    project: &str,
    stage: StageKind,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    let handle = state.registry.get(project)?;
    let inputs = parse_inputs(stage, json_body(body)?)?;
    let run = state.orchestrator.run(&handle, inputs).await?;
    Ok(Json(run_view(&run)))
}

/// POST /projects/:project/generate-image
pub async fn generate_image(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    run_stage(&state, &project, StageKind::Image, body).await
}

/// POST /projects/:project/generate-video
pub async fn generate_video(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    run_stage(&state, &project, StageKind::Video, body).await
}

/// POST /projects/:project/generate-speech
pub async fn generate_speech(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    run_stage(&state, &project, StageKind::Speech, body).await
}

/// POST /projects/:project/generate-music
pub async fn generate_music(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    run_stage(&state, &project, StageKind::Music, body).await
}

/// POST /projects/:project/generate-sfx
pub async fn generate_sfx(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    run_stage(&state, &project, StageKind::Sfx, body).await
}

/// POST /projects/:project/lipsync
pub async fn lipsync(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    run_stage(&state, &project, StageKind::LipSync, body).await
}

/// POST /projects/:project/assemble
pub async fn assemble(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    run_stage(&state, &project, StageKind::Assembly, body).await
}

/// Routes for stage execution
pub fn stage_routes() -> Router {
    Router::new()
        .route("/projects/:project/generate-image", post(generate_image))
        .route("/projects/:project/generate-video", post(generate_video))
        .route("/projects/:project/generate-speech", post(generate_speech))
        .route("/projects/:project/generate-music", post(generate_music))
        .route("/projects/:project/generate-sfx", post(generate_sfx))
        .route("/projects/:project/lipsync", post(lipsync))
        .route("/projects/:project/assemble", post(assemble))
}
