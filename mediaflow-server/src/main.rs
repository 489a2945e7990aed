use anyhow::Context;
use mediaflow::config::MediaflowConfig;
use mediaflow::observability::{init_logging, DEFAULT_LOG_FILTER};
use mediaflow_server::{app, AppState};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config_path = std::env::var("MEDIAFLOW_CONFIG").ok().map(PathBuf::from);
    let config = MediaflowConfig::load(config_path.as_deref())?;
    init_logging(config.log_format, DEFAULT_LOG_FILTER)?;

    if let Err(e) = std::fs::create_dir_all(&config.project_root) {
        tracing::warn!("Failed to create project root {}: {}", config.project_root.display(), e);
    } else {
        tracing::info!("Project root ready at {}", config.project_root.display());
    }

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::from_config(config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
