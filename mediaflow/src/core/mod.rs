//! Core domain model types for mediaflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - The fixed set of stage kinds
//! - Per-stage state (`Empty` or `Ready`)
//! - Artifact records and their metadata

mod artifact;
mod status;

pub use artifact::{Metadata, StageArtifact};
pub use status::{StageKind, StageState, UnknownStageError};
