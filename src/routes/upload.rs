use axum::{
    extract::{Multipart, State},
    http::Method,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{error::AppError, models::EdaReport, services::file_processor, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/upload", post(upload_file))
        .layer(cors)
}

#[axum::debug_handler]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<EdaReport>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::InvalidInput("No file part in request".to_string()))?;
    if file_name.is_empty() {
        return Err(AppError::InvalidInput("No selected file".to_string()));
    }

    tracing::info!("Received upload {}, size: {}KB", file_name, data.len() / 1024);

    // Parsing and rendering are CPU-bound
    let store = state.store.clone();
    let renderer = state.renderer.clone();
    let report = tokio::task::spawn_blocking(move || {
        file_processor::analyze_upload(&file_name, data, &store, renderer.as_ref())
    })
    .await??;

    Ok(Json(report))
}
