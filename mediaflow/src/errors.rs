//! Error types for the mediaflow pipeline.
//!
//! The taxonomy separates caller bugs (`PreconditionError`), untrusted input
//! (`PathEscapeError`), collaborator failures (`ExecutionError`) and missing
//! inputs (`NotFoundError`). None of them is retried here; retry policy
//! belongs to whoever drives the pipeline.

use crate::core::StageKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for mediaflow operations.
#[derive(Debug, Error)]
pub enum MediaflowError {
    /// A stage was driven while its dependencies were not satisfied.
    #[error("{0}")]
    Precondition(#[from] PreconditionError),

    /// An untrusted path tried to leave the project root.
    #[error("{0}")]
    PathEscape(#[from] PathEscapeError),

    /// A stage executor failed or timed out.
    #[error("{0}")]
    Execution(#[from] ExecutionError),

    /// A referenced input artifact does not exist in the store.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// An artifact record was rejected (e.g. empty path).
    #[error("Invalid artifact for stage '{stage}': {reason}")]
    InvalidArtifact {
        /// The stage the artifact was reported for.
        stage: StageKind,
        /// Why it was rejected.
        reason: String,
    },

    /// A project identifier failed validation.
    #[error("Invalid project id '{0}'")]
    InvalidProject(String),

    /// A project identifier is already registered.
    #[error("Project '{0}' already exists")]
    ProjectExists(String),

    /// No project is registered under the identifier.
    #[error("Unknown project '{0}'")]
    UnknownProject(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaflowError {
    /// Returns the contract error info, when the error carries one.
    #[must_use]
    pub fn error_info(&self) -> Option<&ContractErrorInfo> {
        match self {
            Self::Precondition(e) => Some(&e.error_info),
            Self::PathEscape(e) => Some(&e.error_info),
            Self::Execution(e) => Some(&e.error_info),
            Self::NotFound(e) => Some(&e.error_info),
            _ => None,
        }
    }

    /// Short machine-readable kind, used in structured responses.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Precondition(_) => "precondition",
            Self::PathEscape(_) => "path_escape",
            Self::Execution(e) if e.invalid_input => "invalid_input",
            Self::Execution(_) => "execution",
            Self::NotFound(_) => "not_found",
            Self::InvalidArtifact { .. } => "invalid_artifact",
            Self::InvalidProject(_) => "invalid_project",
            Self::ProjectExists(_) => "project_exists",
            Self::UnknownProject(_) => "unknown_project",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        if let Some(info) = self.error_info() {
            let info_map: serde_json::Map<String, serde_json::Value> =
                info.to_dict().into_iter().collect();
            map.insert("error_info".to_string(), serde_json::Value::Object(info_map));
        }
        map
    }
}

impl From<serde_json::Error> for MediaflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "PIPELINE-001-PRECONDITION").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::Value::String(self.code.clone()));
        map.insert("summary".to_string(), serde_json::Value::String(self.summary.clone()));

        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::Value::String(hint.clone()));
        }
        if !self.context.is_empty() {
            let context_map: serde_json::Map<String, serde_json::Value> = self
                .context
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            map.insert("context".to_string(), serde_json::Value::Object(context_map));
        }

        map
    }
}

/// Error raised when a stage is produced while its dependencies are not satisfied,
/// or when an upstream artifact changed while the stage was executing.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PreconditionError {
    /// The stage that was driven.
    pub stage: StageKind,
    /// Upstream stages that were not in the expected state.
    pub unsatisfied: Vec<StageKind>,
    /// The error message.
    pub message: String,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl PreconditionError {
    /// Creates an error for a stage whose required dependencies are not `Ready`.
    #[must_use]
    pub fn dependencies_unsatisfied(stage: StageKind, missing: Vec<StageKind>) -> Self {
        let names = join_stages(&missing);
        let message = format!(
            "attempted to produce an artifact for stage '{stage}' whose dependencies are not satisfied (not ready: {names})"
        );
        let info = ContractErrorInfo::new("PIPELINE-001-PRECONDITION", message.clone())
            .with_fix_hint("Produce the upstream stages first, or disable the action while they are empty.")
            .with_context_entry("stage", stage.to_string())
            .with_context_entry("missing", names);

        Self {
            stage,
            unsatisfied: missing,
            message,
            error_info: info,
        }
    }

    /// Creates an error for upstream artifacts that were replaced or
    /// invalidated while the stage was executing.
    #[must_use]
    pub fn stale_upstream(stage: StageKind, changed: Vec<StageKind>) -> Self {
        let names = join_stages(&changed);
        let message = format!(
            "stage '{stage}' or its upstream artifacts changed while it was executing (changed: {names})"
        );
        let info = ContractErrorInfo::new("PIPELINE-001-PRECONDITION", message.clone())
            .with_fix_hint("Run the stage again against the current upstream artifacts.")
            .with_context_entry("stage", stage.to_string())
            .with_context_entry("changed", names);

        Self {
            stage,
            unsatisfied: changed,
            message,
            error_info: info,
        }
    }
}

/// Error raised when a path is absolute, contains `..`, or otherwise
/// resolves outside the project root.
#[derive(Debug, Clone, Error)]
#[error("Path '{path}' rejected: {reason}")]
pub struct PathEscapeError {
    /// The offending path as received.
    pub path: String,
    /// Why it was rejected.
    pub reason: String,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl PathEscapeError {
    /// Creates a new path escape error.
    #[must_use]
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        let reason = reason.into();
        let info = ContractErrorInfo::new(
            "PIPELINE-002-PATH_ESCAPE",
            format!("Path '{path}' is not a root-relative artifact path"),
        )
        .with_fix_hint("Send slash-separated paths relative to the project root, without '..' segments.")
        .with_context_entry("reason", reason.clone());

        Self {
            path,
            reason,
            error_info: info,
        }
    }
}

/// Error raised when an input artifact referenced by a stage is missing.
#[derive(Debug, Clone, Error)]
#[error("Artifact not found for stage '{stage}' input '{input}': {path}")]
pub struct NotFoundError {
    /// The stage whose input is missing.
    pub stage: StageKind,
    /// The input name (e.g. "image_path").
    pub input: String,
    /// The root-relative path that was looked up.
    pub path: String,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl NotFoundError {
    /// Creates a new not found error.
    #[must_use]
    pub fn new(stage: StageKind, input: impl Into<String>, path: impl Into<String>) -> Self {
        let input = input.into();
        let path = path.into();
        let info = ContractErrorInfo::new(
            "PIPELINE-003-NOT_FOUND",
            format!("Input '{input}' of stage '{stage}' does not exist"),
        )
        .with_context_entry("path", path.clone());

        Self {
            stage,
            input,
            path,
            error_info: info,
        }
    }
}

/// Error raised when a stage executor fails. State is never mutated when
/// this is returned, so the same stage can be retried.
#[derive(Debug, Clone, Error)]
#[error("Stage '{stage}' execution failed: {reason}")]
pub struct ExecutionError {
    /// The stage that failed.
    pub stage: StageKind,
    /// The failure reason.
    pub reason: String,
    /// Whether the failure was a timeout.
    pub timed_out: bool,
    /// Whether the executor refused the request inputs before doing any
    /// work, e.g. an empty prompt or an out-of-range duration.
    pub invalid_input: bool,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl ExecutionError {
    /// Creates a new execution error.
    #[must_use]
    pub fn new(stage: StageKind, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let info = ContractErrorInfo::new(
            "PIPELINE-004-EXECUTION",
            format!("Executor for stage '{stage}' failed"),
        )
        .with_fix_hint("The pipeline state was not changed; the stage can be retried.")
        .with_context_entry("reason", reason.clone());

        Self {
            stage,
            reason,
            timed_out: false,
            invalid_input: false,
            error_info: info,
        }
    }

    /// Creates an execution error for an executor that exceeded its timeout.
    #[must_use]
    pub fn timeout(stage: StageKind, timeout_seconds: f64) -> Self {
        let mut err = Self::new(stage, format!("timed out after {timeout_seconds}s"));
        err.timed_out = true;
        err.error_info = err
            .error_info
            .with_context_entry("timeout_seconds", timeout_seconds.to_string());
        err
    }

    /// Creates an execution error for request inputs the executor rejects.
    #[must_use]
    pub fn invalid_input(stage: StageKind, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let info = ContractErrorInfo::new(
            "PIPELINE-005-INVALID_INPUT",
            format!("Executor for stage '{stage}' rejected its inputs"),
        )
        .with_fix_hint("Correct the request inputs and run the stage again.")
        .with_context_entry("reason", reason.clone());

        Self {
            stage,
            reason,
            timed_out: false,
            invalid_input: true,
            error_info: info,
        }
    }
}

fn join_stages(stages: &[StageKind]) -> String {
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
