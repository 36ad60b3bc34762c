use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::{error_response, internal_error};
use crate::domain::{ContentType, Document};
use crate::presentation::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub chunk_count: usize,
    pub message: String,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn file_upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                tracing::warn!("Upload request with no file");
                return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {e}"),
                );
            }
        };

        if field.name() == Some(FILE_FIELD) {
            return ingest_field(&state, field).await;
        }
    }
}

async fn ingest_field(state: &AppState, field: Field<'_>) -> Response {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let declared = field.content_type().map(str::to_string);

    let Some(content_type) = ContentType::detect(declared.as_deref(), &filename) else {
        tracing::warn!(filename = %filename, content_type = ?declared, "Unsupported file type");
        return error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("Unsupported file type: {filename}"),
        );
    };

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read file bytes");
            return error_response(StatusCode::BAD_REQUEST, format!("Failed to read file: {e}"));
        }
    };

    tracing::debug!(filename = %filename, bytes = data.len(), "File received");
    let document = Document::new(filename.clone(), content_type, data.len() as u64);

    match state.rag_service.ingest(&data, &document).await {
        Ok(chunk_count) => {
            let message = if chunk_count == 0 {
                "No extractable text found".to_string()
            } else {
                "File processed successfully".to_string()
            };
            tracing::info!(filename = %filename, chunk_count, "Upload ingested");
            (
                StatusCode::OK,
                Json(UploadResponse {
                    filename,
                    chunk_count,
                    message,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, filename = %filename, "Ingestion failed");
            internal_error(state.settings.server.debug, "Ingestion failed", &e)
        }
    }
}
