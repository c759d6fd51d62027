use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use services::plot_store::PlotStore;
use services::render::ChartRenderer;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub store: PlotStore,
    pub renderer: Arc<dyn ChartRenderer>,
}

impl AppState {
    pub fn new(config: config::Config, renderer: Arc<dyn ChartRenderer>) -> Self {
        let store = PlotStore::new(&config.media_root, config.shared_plot_dir);
        Self { config, store, renderer }
    }
}

/// Builds the full router: health check, upload endpoint and the plot media routes.
pub fn app(state: Arc<AppState>) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .merge(routes::routes())
        .merge(routes::upload::routes())
        .merge(routes::media::routes(state.store.root()))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
