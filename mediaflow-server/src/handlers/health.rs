//! Liveness endpoint.

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Routes for health checks
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}
