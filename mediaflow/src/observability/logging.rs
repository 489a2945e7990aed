//! Tracing subscriber setup.

use crate::config::LogFormat;
use crate::errors::MediaflowError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,mediaflow=info,tower_http=info,hyper=warn";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this twice
/// returns a config error instead of panicking.
pub fn init_logging(format: LogFormat, default_filter: &str) -> Result<(), MediaflowError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| MediaflowError::Config(format!("Invalid log filter: {e}")))?;

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(cfg!(debug_assertions))
            .with_line_number(cfg!(debug_assertions))
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| MediaflowError::Config(format!("Failed to install subscriber: {e}")))
}
