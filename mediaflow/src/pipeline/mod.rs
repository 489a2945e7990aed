//! Pipeline state tracking and execution.
//!
//! This module provides:
//! - The fixed stage dependency graph
//! - The per-project state tracker and its invalidation walk
//! - A registry of independent projects
//! - The orchestrator that runs executors and records their artifacts

mod graph;
mod orchestrator;
mod project;
mod registry;

#[cfg(test)]
mod integration_tests;

pub use graph::{DependencyEdge, DependencyGraph, EdgeKind, MEDIA_PIPELINE_EDGES};
pub use orchestrator::{Orchestrator, StageRun};
pub use project::{Project, Transition, UpstreamSnapshot};
pub use registry::{validate_project_id, ProjectHandle, ProjectRegistry};
