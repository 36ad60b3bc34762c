use std::sync::Arc;

use crate::application::ports::{FileLoader, TextSplitter};
use crate::domain::{Chunk, Document, DocumentId};

/// Turns raw document bytes into overlapping chunks.
///
/// Never fails: unreadable or empty documents are logged and produce no
/// chunks, which callers treat as "no content".
pub struct DocumentChunker {
    file_loader: Arc<dyn FileLoader>,
    text_splitter: Arc<dyn TextSplitter>,
}

impl DocumentChunker {
    pub fn new(file_loader: Arc<dyn FileLoader>, text_splitter: Arc<dyn TextSplitter>) -> Self {
        Self {
            file_loader,
            text_splitter,
        }
    }

    #[tracing::instrument(
        skip(self, data),
        fields(document_id = %document.id.as_uuid(), filename = %document.filename)
    )]
    pub async fn load(&self, data: &[u8], document: &Document) -> Vec<Chunk> {
        let text = match self.file_loader.extract_text(data, document).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Document could not be read, skipping");
                return Vec::new();
            }
        };

        self.process(&text, &document.filename, document.id).await
    }

    pub async fn process(
        &self,
        raw_text: &str,
        source_id: &str,
        document_id: DocumentId,
    ) -> Vec<Chunk> {
        if raw_text.trim().is_empty() {
            tracing::info!(source = %source_id, "No extractable text");
            return Vec::new();
        }

        match self.text_splitter.split(raw_text, source_id, document_id).await {
            Ok(chunks) => {
                tracing::debug!(source = %source_id, chunk_count = chunks.len(), "Text split");
                chunks
            }
            Err(e) => {
                tracing::warn!(source = %source_id, error = %e, "Text splitting failed");
                Vec::new()
            }
        }
    }
}
