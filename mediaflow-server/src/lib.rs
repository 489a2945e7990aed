//! HTTP API for the mediaflow pipeline.
//!
//! Every route works on an explicit project created with `POST /projects`.
//! Stage endpoints run the stage through the shared
//! [`Orchestrator`](mediaflow::pipeline::Orchestrator) and return the
//! recorded artifact path, its metadata and the stages it invalidated.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod error;
pub mod handlers;
pub mod state;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

/// Builds the application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::health::health_routes())
        .merge(handlers::projects::project_routes())
        .merge(handlers::stages::stage_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
