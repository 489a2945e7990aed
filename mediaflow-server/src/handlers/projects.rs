//! Project lifecycle endpoints: create, inspect, reset, delete, invalidate.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use mediaflow::core::StageKind;
use mediaflow::errors::MediaflowError;
use mediaflow::pipeline::Project;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{json_body, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

/// Renders a project with each stage's state and whether it can run now.
pub fn project_view(project: &Project) -> Value {
    let stages: serde_json::Map<String, Value> = project
        .states()
        .map(|(stage, state)| {
            let mut view = json!(state);
            view["executable"] = json!(project.can_execute(stage));
            view["unsatisfied"] = json!(project.unsatisfied_dependencies(stage));
            (stage.to_string(), view)
        })
        .collect();

    json!({
        "id": project.id(),
        "generation": project.generation(),
        "created_at": project.created_at(),
        "updated_at": project.updated_at(),
        "stages": stages,
    })
}

/// POST /projects - Create a project
pub async fn create_project(
    Extension(state): Extension<Arc<AppState>>,
    request: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request = json_body(request)?;
    let handle = state.registry.create(&request.name)?;
    Ok((StatusCode::CREATED, Json(project_view(&handle.snapshot()))))
}

/// GET /projects - List project ids
pub async fn list_projects(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "projects": state.registry.list() }))
}

/// GET /projects/:project - Project snapshot
pub async fn get_project(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let handle = state.registry.get(&project)?;
    Ok(Json(project_view(&handle.snapshot())))
}

/// DELETE /projects/:project - Forget a project
pub async fn delete_project(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.registry.remove(&project)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /projects/:project/reset - Empty every stage
pub async fn reset_project(
    Path(project): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let handle = state.registry.get(&project)?;
    state.orchestrator.reset(&handle).await;
    Ok(Json(project_view(&handle.snapshot())))
}

/// POST /projects/:project/stages/:stage/invalidate - Force a stage empty
pub async fn invalidate_stage(
    Path((project, stage)): Path<(String, String)>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let stage: StageKind = stage
        .parse()
        .map_err(|e: mediaflow::core::UnknownStageError| {
            MediaflowError::Serialization(e.to_string())
        })?;
    let handle = state.registry.get(&project)?;
    let transition = state.orchestrator.invalidate(&handle, stage).await;

    Ok(Json(json!({
        "message": format!("Stage '{stage}' invalidated"),
        "stage": stage,
        "invalidated": transition.invalidated,
    })))
}

/// Routes for project management
pub fn project_routes() -> Router {
    Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route("/projects/:project", get(get_project).delete(delete_project))
        .route("/projects/:project/reset", post(reset_project))
        .route("/projects/:project/stages/:stage/invalidate", post(invalidate_stage))
}
