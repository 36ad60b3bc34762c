use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Document;

/// Pulls plain text out of an uploaded document.
///
/// Implementations return sanitised text, or [`FileLoaderError::NoTextFound`]
/// when the document parses but carries no text layer.
#[async_trait]
pub trait FileLoader: Send + Sync {
    async fn extract_text(
        &self,
        data: &[u8],
        document: &Document,
    ) -> Result<String, FileLoaderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FileLoaderError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("extraction timed out after {0:?}")]
    TimedOut(Duration),
    #[error("no text found in {0}")]
    NoTextFound(String),
}
