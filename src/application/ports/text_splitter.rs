use async_trait::async_trait;

use crate::domain::{Chunk, DocumentId};

/// Cuts extracted text into bounded, possibly overlapping chunks numbered
/// from 0. Blank input yields no chunks.
#[async_trait]
pub trait TextSplitter: Send + Sync {
    async fn split(
        &self,
        text: &str,
        source_id: &str,
        document_id: DocumentId,
    ) -> Result<Vec<Chunk>, TextSplitterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TextSplitterError {
    #[error("invalid splitter configuration: {0}")]
    InvalidConfiguration(String),
    #[error("tokenizer unavailable: {0}")]
    TokenizerUnavailable(String),
}
