use anyhow::Result;
use std::sync::Arc;

use eda_service::{app, config, logging, services::render::PlottersRenderer, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!(
        "Plot store at {} ({} layout)",
        config.media_root.display(),
        if config.shared_plot_dir { "shared" } else { "per-request" }
    );

    let state = Arc::new(AppState::new(config, Arc::new(PlottersRenderer::default())));
    state.store.ensure_root()?;

    let addr = state.config.bind_addr;
    let app = app(state);

    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
