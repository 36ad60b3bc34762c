use async_trait::async_trait;

use crate::domain::Embedding;

/// Turns text into unit-norm vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError>;

    /// Embeds every text in order. An empty slice yields an empty vec without
    /// any remote call.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbedderError {
    #[error("embedding api request failed: HTTP {status}: {body}")]
    ApiRequestFailed { status: u16, body: String },
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    #[error("embedding transport error: {0}")]
    Transport(#[source] reqwest::Error),
}
