//! Observability utilities.

mod logging;
mod timing;

pub use logging::{init_logging, DEFAULT_LOG_FILTER};
pub use timing::ExecutionTimer;
