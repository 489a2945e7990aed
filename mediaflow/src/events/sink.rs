//! Event sink trait and implementations.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, Level};

/// Receives pipeline events from the orchestrator.
#[async_trait]
pub trait EventSink: Send + Sync + std::fmt::Debug {
    /// Emits one event, e.g. `stage.produced` with the project, stage and
    /// artifact path as payload.
    ///
    /// Sinks must not fail the caller; delivery problems are theirs to log.
    async fn emit(&self, event_type: &str, data: Option<Value>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Writes events to the tracing subscriber, lifting `project` and `stage`
/// out of the payload into structured fields.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a sink logging at `level`. Levels other than `DEBUG` log at
    /// `INFO`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

fn payload_str<'a>(data: Option<&'a Value>, key: &str) -> &'a str {
    data.and_then(|d| d.get(key))
        .and_then(Value::as_str)
        .unwrap_or("-")
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        let project = payload_str(data.as_ref(), "project");
        let stage = payload_str(data.as_ref(), "stage");
        match self.level {
            Level::DEBUG => {
                debug!(event_type, project, stage, event_data = ?data, "Pipeline event");
            }
            _ => info!(event_type, project, stage, event_data = ?data, "Pipeline event"),
        }
    }
}

/// One event captured by a [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    /// The event name, e.g. `stage.invalidated`.
    pub event_type: String,
    /// The payload, if any.
    pub data: Option<Value>,
}

/// Keeps every event in memory, in emission order. Used by tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<EmittedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every captured event.
    #[must_use]
    pub fn events(&self) -> Vec<EmittedEvent> {
        self.events.read().clone()
    }

    /// Returns the captured event names, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Returns the payloads of events named `event_type`.
    #[must_use]
    pub fn events_of_type(&self, event_type: &str) -> Vec<Option<Value>> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .map(|e| e.data.clone())
            .collect()
    }

    /// Returns the number of captured events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Forgets every captured event.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.events.write().push(EmittedEvent {
            event_type: event_type.to_string(),
            data,
        });
    }
}
