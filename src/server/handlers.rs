use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use super::error::{AppError, AppResult};
use super::AppState;
use crate::config::ScoringMode;
use crate::record::FlowBatch;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub mode: ScoringMode,
    pub classifier_loaded: bool,
    pub archive_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<String>,
}

pub async fn home() -> &'static str {
    "Flow labeling backend is running"
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        mode: state.pipeline.mode(),
        classifier_loaded: state.pipeline.classifier_available(),
        archive_enabled: state.archive.is_some(),
    })
}

/// Multipart CSV upload in `file` → the same CSV with a label column, as an attachment.
pub async fn predict(State(state): State<AppState>, mut multipart: Multipart) -> AppResult<Response> {
    if state.pipeline.mode() == ScoringMode::Classifier && !state.pipeline.classifier_available() {
        return Err(AppError::ModelUnavailable);
    }

    let upload = read_upload(&mut multipart).await?;
    let text = String::from_utf8(upload)
        .map_err(|_| AppError::BadRequest("Uploaded file is not UTF-8 text.".into()))?;

    let worker = state.clone();
    let (csv, name) = tokio::task::spawn_blocking(move || -> AppResult<(String, String)> {
        let batch = FlowBatch::from_csv_str(&text)?;
        let labeled = worker.pipeline.label_batch(batch)?;
        let csv = labeled.to_csv(&worker.config.output.label_column);
        let name = match worker.archive.as_ref() {
            Some(archive) => {
                let entry = archive.store(&csv, &labeled.summary())?;
                tracing::info!(archive = %entry.name, sha256 = %entry.sha256, "batch archived");
                entry.name
            }
            None => format!("classified_{}.csv", Utc::now().format("%Y%m%d_%H%M%S")),
        };
        Ok((csv, name))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(csv_attachment(csv, &name))
}

pub async fn list_files(State(state): State<AppState>) -> AppResult<Json<FilesResponse>> {
    let Some(archive) = state.archive.clone() else {
        return Ok(Json(FilesResponse { files: Vec::new() }));
    };
    let entries = tokio::task::spawn_blocking(move || archive.list())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(Json(FilesResponse {
        files: entries.into_iter().map(|e| e.name).collect(),
    }))
}

pub async fn download_file(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<Response> {
    let Some(archive) = state.archive.clone() else {
        return Err(AppError::NotFound("File not found".into()));
    };
    let lookup = name.clone();
    let content = tokio::task::spawn_blocking(move || archive.read(&lookup))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    match content {
        Some(csv) => Ok(csv_attachment(csv, &name)),
        None => Err(AppError::NotFound("File not found".into())),
    }
}

async fn read_upload(multipart: &mut Multipart) -> AppResult<Vec<u8>> {
    let missing = || AppError::BadRequest("No file part or selected file in the request.".into());
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if field.file_name().map_or(true, str::is_empty) {
            return Err(missing());
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok(bytes.to_vec());
    }
    Err(missing())
}

fn csv_attachment(csv: String, name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
        ],
        csv,
    )
        .into_response()
}
