//! Executor wall-clock timing.

use crate::core::StageKind;
use std::time::Instant;
use tracing::debug;

/// Measures one executor run and logs its duration when finished.
#[derive(Debug)]
pub struct ExecutionTimer {
    stage: StageKind,
    start: Instant,
}

impl ExecutionTimer {
    /// Starts timing an execution of `stage`.
    #[must_use]
    pub fn start(stage: StageKind) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }

    /// Returns the stage being timed.
    #[must_use]
    pub const fn stage(&self) -> StageKind {
        self.stage
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Stops the timer, logs the duration and returns it in milliseconds.
    pub fn finish(self, succeeded: bool) -> f64 {
        let duration_ms = self.elapsed_ms();
        debug!(stage = %self.stage, duration_ms, succeeded, "Executor finished");
        duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_timer() {
        let timer = ExecutionTimer::start(StageKind::Image);
        assert_eq!(timer.stage(), StageKind::Image);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.finish(true) >= 10.0);
    }
}
