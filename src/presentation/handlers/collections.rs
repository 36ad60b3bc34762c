use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::internal_error;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct CountResponse {
    pub collection: String,
    pub count: u64,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub collection: String,
    pub message: String,
}

#[tracing::instrument(skip(state))]
pub async fn collection_count_handler(State(state): State<AppState>) -> Response {
    match state.rag_service.count().await {
        Ok(count) => Json(CountResponse {
            collection: state.rag_service.collection().to_string(),
            count,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Collection count failed");
            internal_error(state.settings.server.debug, "Collection count failed", &e)
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn reset_collection_handler(State(state): State<AppState>) -> Response {
    match state.rag_service.reset().await {
        Ok(()) => Json(ResetResponse {
            collection: state.rag_service.collection().to_string(),
            message: "Collection reset".to_string(),
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Collection reset failed");
            internal_error(state.settings.server.debug, "Collection reset failed", &e)
        }
    }
}
