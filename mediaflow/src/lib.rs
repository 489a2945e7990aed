//! # Mediaflow
//!
//! Stage dependency tracking and orchestration for a text-to-multimedia
//! generation pipeline.
//!
//! A project moves through seven artifact-producing stages (image, video,
//! speech, music, sfx, lip-sync, assembly). Mediaflow keeps track of which
//! artifacts are current:
//!
//! - **Dependency graph**: a fixed set of edges decides which stages may run
//! - **Invalidation**: recording or clearing a stage empties everything
//!   downstream of it
//! - **Path contract**: every artifact path is relative to one project root
//!   and can never escape it
//! - **Orchestration**: executors run outside the project lock; their output
//!   is only recorded if the inputs they consumed are still current
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mediaflow::prelude::*;
//!
//! let config = MediaflowConfig::load(None)?;
//! let orchestrator = Orchestrator::from_config(&config);
//! let registry = ProjectRegistry::new();
//! let project = registry.create("demo")?;
//!
//! let inputs = StageInputs::Image {
//!     prompt: "a lighthouse".into(),
//!     negative_prompt: String::new(),
//! };
//! orchestrator.run(&project, inputs).await?;
//! assert!(project.can_execute(StageKind::Video));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod executors;
pub mod observability;
pub mod paths;
pub mod pipeline;
pub mod store;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{LogFormat, MediaflowConfig};
    pub use crate::core::{Metadata, StageArtifact, StageKind, StageState};
    pub use crate::errors::{
        ContractErrorInfo, ExecutionError, MediaflowError, NotFoundError, PathEscapeError,
        PreconditionError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::executors::{ExecutionOutput, ExportSettings, StageExecutor, StageInputs};
    pub use crate::paths::{ProjectPath, ProjectRoot};
    pub use crate::pipeline::{
        DependencyGraph, Orchestrator, Project, ProjectHandle, ProjectRegistry, StageRun,
        Transition,
    };
    pub use crate::store::{ArtifactStore, FsArtifactStore, InMemoryArtifactStore};
    pub use crate::utils::iso_timestamp;
}
