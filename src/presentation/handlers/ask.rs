use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::{error_response, internal_error};
use crate::application::services::AnswerStream;
use crate::domain::SourceExcerpt;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Serialize)]
struct StreamPreamble<'a> {
    confidence: f32,
    sources: &'a [SourceExcerpt],
}

/// Runs the answer workflow. Downstream failures come back as a normal
/// answer with confidence 0 and an apology, never as a 5xx.
#[tracing::instrument(skip(state, request))]
pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Response {
    if request.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query must not be empty");
    }
    tracing::debug!(query = %sanitize_prompt(&request.query), "Processing question");

    let outcome = state.workflow.run(&request.query).await;
    tracing::info!(
        confidence = outcome.confidence,
        sources_count = outcome.sources.len(),
        failed = outcome.error.is_some(),
        "Question answered"
    );

    (StatusCode::OK, Json(outcome)).into_response()
}

/// Server-sent events: one `sources` event, then `token` events as the model
/// produces text, then `done` (or `error` if the model stream breaks).
#[tracing::instrument(skip(state, request))]
pub async fn ask_stream_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Response {
    if request.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query must not be empty");
    }
    tracing::debug!(query = %sanitize_prompt(&request.query), "Processing streaming question");

    let answer_request = state.rag_service.request(request.query);
    let AnswerStream {
        confidence,
        sources,
        mut tokens,
    } = match state.rag_service.answer_stream(&answer_request).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Streaming answer failed");
            return internal_error(state.settings.server.debug, "Answer failed", &e);
        }
    };

    let sse_stream = async_stream::stream! {
        let preamble = serde_json::to_string(&StreamPreamble {
            confidence,
            sources: &sources,
        })
        .unwrap_or_default();
        yield Ok::<_, Infallible>(Event::default().event("sources").data(preamble));

        while let Some(fragment) = tokens.next().await {
            match fragment {
                Ok(text) => yield Ok(Event::default().event("token").data(text)),
                Err(e) => {
                    tracing::error!(error = %e, "Stream token error");
                    yield Ok(Event::default().event("error").data(e.to_string()));
                    return;
                }
            }
        }

        yield Ok(Event::default().event("done").data("[DONE]"));
    };

    Sse::new(sse_stream)
        .keep_alive(KeepAlive::new().interval(SSE_KEEP_ALIVE).text("keep-alive"))
        .into_response()
}
