//! Event sink system for pipeline observability.
//!
//! The orchestrator reports every stage start, success, failure and
//! invalidation to an [`EventSink`]. Sinks are passed explicitly; there is no
//! process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EmittedEvent, EventSink, LoggingEventSink, NoOpEventSink};

/// A stage executor was invoked.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage artifact was recorded.
pub const STAGE_PRODUCED: &str = "stage.produced";
/// A stage executor or commit failed; state is unchanged.
pub const STAGE_FAILED: &str = "stage.failed";
/// A stage was forced back to `Empty`.
pub const STAGE_INVALIDATED: &str = "stage.invalidated";
/// Every stage of a project was reset.
pub const PROJECT_RESET: &str = "project.reset";
