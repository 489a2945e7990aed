//! Shared application state.

use mediaflow::config::MediaflowConfig;
use mediaflow::pipeline::{Orchestrator, ProjectRegistry};

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
    /// Live projects.
    pub registry: ProjectRegistry,
    /// Runs executors and records artifacts.
    pub orchestrator: Orchestrator,
    /// Loaded configuration.
    pub config: MediaflowConfig,
}

impl AppState {
    /// Builds the state with the placeholder executors over the configured
    /// project root.
    #[must_use]
    pub fn from_config(config: MediaflowConfig) -> Self {
        Self {
            registry: ProjectRegistry::new(),
            orchestrator: Orchestrator::from_config(&config),
            config,
        }
    }

    /// Builds the state around an existing orchestrator.
    #[must_use]
    pub fn with_orchestrator(config: MediaflowConfig, orchestrator: Orchestrator) -> Self {
        Self {
            registry: ProjectRegistry::new(),
            orchestrator,
            config,
        }
    }
}
