//! HTTP boundary: upload a CSV batch, get it back labeled; browse archived batches.

mod error;
mod handlers;

pub use error::{AppError, AppResult};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::LabelerConfig;
use crate::pipeline::LabelingPipeline;
use crate::storage::BatchArchive;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LabelingPipeline>,
    pub archive: Option<Arc<BatchArchive>>,
    pub config: Arc<LabelerConfig>,
}

pub fn router(state: AppState) -> Router {
    let limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::home))
        .route("/api/health", get(handlers::health))
        .route("/api/predict", post(handlers::predict))
        .route("/api/files", get(handlers::list_files))
        .route("/api/files/:name", get(handlers::download_file))
        .layer(DefaultBodyLimit::max(limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn serve(state: AppState, bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
}
