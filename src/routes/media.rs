use axum::{
    extract::State,
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::{
    error::AppError,
    services::{archive, plot_store::MEDIA_URL_PREFIX},
    AppState,
};

pub fn routes(media_root: &Path) -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route(&format!("{}/all.zip", MEDIA_URL_PREFIX), get(download_all))
        .nest_service(MEDIA_URL_PREFIX, ServeDir::new(media_root))
        .layer(cors)
}

/// Bundles every rendered chart into one zip download.
pub async fn download_all(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let root = state.store.root().to_path_buf();
    let bytes = tokio::task::spawn_blocking(move || archive::build_archive(&root)).await??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"all.zip\""),
        ],
        bytes,
    ))
}
