mod ask;
mod collections;
mod health;
mod upload;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub use ask::{AskRequest, ask_handler, ask_stream_handler};
pub use collections::{collection_count_handler, reset_collection_handler};
pub use health::health_handler;
pub use upload::file_upload_handler;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// 500 with the cause spelled out only when the server runs in debug mode.
pub(crate) fn internal_error(
    debug: bool,
    context: &str,
    cause: &dyn std::fmt::Display,
) -> Response {
    let message = if debug {
        format!("{context}: {cause}")
    } else {
        context.to_string()
    };
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}
