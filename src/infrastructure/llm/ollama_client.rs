use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{GenerationOptions, LlmClient, LlmClientError, LlmTokenStream};
use crate::application::services::build_prompt;

/// Text generation through Ollama's `/api/generate`.
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    keep_alive: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: ModelOptions,
    keep_alive: &'a str,
}

#[derive(Serialize)]
struct ModelOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

impl OllamaClient {
    pub fn new(
        base_url: &str,
        model: String,
        keep_alive: String,
        timeout: Duration,
    ) -> Result<Self, LlmClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmClientError::Transport)?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model,
            keep_alive,
        })
    }

    fn request_body<'a>(
        &'a self,
        question: &str,
        context: &[String],
        options: &GenerationOptions,
        stream: bool,
    ) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt: build_prompt(options.system_prompt.as_deref(), context, question),
            stream,
            options: ModelOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
            keep_alive: &self.keep_alive,
        }
    }

    async fn send(&self, body: &GenerateRequest<'_>) -> Result<reqwest::Response, LlmClientError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(LlmClientError::Transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmClientError::ApiRequestFailed { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    #[tracing::instrument(
        skip(self, question, context, options),
        fields(model = %self.model, passages = context.len())
    )]
    async fn generate(
        &self,
        question: &str,
        context: &[String],
        options: &GenerationOptions,
    ) -> Result<String, LlmClientError> {
        let body = self.request_body(question, context, options, false);
        let response = self.send(&body).await?;

        let completion: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmClientError::InvalidResponse(e.to_string()))?;

        Ok(completion.response.trim().to_string())
    }

    async fn generate_stream(
        &self,
        question: &str,
        context: &[String],
        options: &GenerationOptions,
    ) -> Result<LlmTokenStream, LlmClientError> {
        let body = self.request_body(question, context, options, true);
        let response = self.send(&body).await?;
        let mut bytes = response.bytes_stream();

        // Ollama streams newline-delimited JSON; only a trailing partial line is held back.
        // A body that closes before a `done` chunk is reported as an error.
        let token_stream = async_stream::stream! {
            let mut pending: Vec<u8> = Vec::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(LlmClientError::Transport(e));
                        return;
                    }
                };
                pending.extend_from_slice(&chunk);

                while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=newline).collect();
                    match parse_chunk(&line) {
                        Ok(Some(parsed)) => {
                            if !parsed.response.is_empty() {
                                yield Ok(parsed.response);
                            }
                            if parsed.done {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            match parse_chunk(&pending) {
                Ok(Some(parsed)) => {
                    if !parsed.response.is_empty() {
                        yield Ok(parsed.response);
                    }
                    if !parsed.done {
                        yield Err(truncated());
                    }
                }
                Ok(None) => yield Err(truncated()),
                Err(e) => yield Err(e),
            }
        };

        Ok(Box::pin(token_stream))
    }
}

fn truncated() -> LlmClientError {
    LlmClientError::InvalidResponse("stream ended before done".to_string())
}

fn parse_chunk(line: &[u8]) -> Result<Option<GenerateChunk>, LlmClientError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(line)
        .map(Some)
        .map_err(|e| LlmClientError::InvalidResponse(e.to_string()))
}
