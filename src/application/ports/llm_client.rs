use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

pub type LlmTokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmClientError>> + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            system_prompt: None,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the trimmed completion for `question` grounded on `context`.
    async fn generate(
        &self,
        question: &str,
        context: &[String],
        options: &GenerationOptions,
    ) -> Result<String, LlmClientError>;

    /// Same prompt as [`LlmClient::generate`], yielding fragments as they arrive.
    async fn generate_stream(
        &self,
        question: &str,
        context: &[String],
        options: &GenerationOptions,
    ) -> Result<LlmTokenStream, LlmClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("generation api request failed: HTTP {status}: {body}")]
    ApiRequestFailed { status: u16, body: String },
    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
    #[error("generation transport error: {0}")]
    Transport(#[source] reqwest::Error),
}
