use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{Embedder, EmbedderError};
use crate::domain::Embedding;

/// Embeds text through Ollama's `/api/embeddings`, one request per text.
pub struct OllamaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Option<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: String, timeout: Duration) -> Result<Self, EmbedderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(EmbedderError::Transport)?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/embeddings", base_url.trim_end_matches('/')),
            model,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[tracing::instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(EmbedderError::Transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedderError::ApiRequestFailed { status, body });
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedderError::InvalidResponse(e.to_string()))?;

        let values = embedding_response
            .embedding
            .ok_or_else(|| {
                EmbedderError::InvalidResponse("missing 'embedding' field".to_string())
            })?;

        Ok(Embedding::normalized(values))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}
