//! Testing utilities for mediaflow pipelines.
//!
//! This module provides:
//! - Mock stage executors
//! - Assertions on stage states
//! - A fixture wiring a project, an in-memory store and an orchestrator

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_executable, assert_not_executable, assert_stage_empty, assert_stage_ready,
    assert_stage_ready_at,
};
pub use fixtures::TestFixture;
pub use mocks::{FailingExecutor, MockExecutor, SlowExecutor};
