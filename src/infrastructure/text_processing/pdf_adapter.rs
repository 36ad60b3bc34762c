use std::io::Write;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use pdf_oxide::PdfDocument;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::{ContentType, Document};

use super::text_sanitizer::sanitize_extracted_text;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Extracts the text layer of a PDF. Scanned pages without text are skipped.
#[derive(Default)]
pub struct PdfAdapter {
    timeout: Option<Duration>,
}

impl PdfAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn read_pages(path: &Path) -> Result<Vec<String>, FileLoaderError> {
        let mut pdf = PdfDocument::open(path)
            .map_err(|e| FileLoaderError::ExtractionFailed(format!("failed to parse PDF: {e}")))?;

        let page_count = pdf.page_count().map_err(|e| {
            FileLoaderError::ExtractionFailed(format!("failed to read page count: {e}"))
        })?;

        let mut pages = Vec::with_capacity(page_count);
        for page_index in 0..page_count {
            match pdf.extract_text(page_index) {
                Ok(text) => {
                    let text = sanitize_extracted_text(&text);
                    if !text.is_empty() {
                        pages.push(text);
                    }
                }
                Err(e) => {
                    tracing::debug!(page = page_index + 1, error = %e, "Page has no readable text");
                }
            }
        }

        Ok(pages)
    }
}

#[async_trait]
impl FileLoader for PdfAdapter {
    #[tracing::instrument(
        skip(self, data),
        fields(document_id = %document.id.as_uuid(), filename = %document.filename)
    )]
    async fn extract_text(
        &self,
        data: &[u8],
        document: &Document,
    ) -> Result<String, FileLoaderError> {
        if document.content_type != ContentType::Pdf {
            return Err(FileLoaderError::UnsupportedContentType(
                document.content_type.as_mime().to_string(),
            ));
        }

        // pdf_oxide reads from a path, not a buffer.
        let mut temp_file = tempfile::NamedTempFile::new().map_err(|e| {
            FileLoaderError::ExtractionFailed(format!("failed to create temp file: {e}"))
        })?;
        temp_file.write_all(data).map_err(|e| {
            FileLoaderError::ExtractionFailed(format!("failed to write temp file: {e}"))
        })?;

        let temp_path = temp_file.path().to_path_buf();
        let limit = self.timeout.unwrap_or(EXTRACTION_TIMEOUT);
        let pages = tokio::time::timeout(
            limit,
            tokio::task::spawn_blocking(move || Self::read_pages(&temp_path)),
        )
        .await
        .map_err(|_| FileLoaderError::TimedOut(limit))?
        .map_err(|e| FileLoaderError::ExtractionFailed(format!("task join error: {e}")))??;

        drop(temp_file);
        tracing::info!(page_count = pages.len(), "PDF text extracted");

        if pages.is_empty() {
            return Err(FileLoaderError::NoTextFound(document.filename.clone()));
        }
        Ok(pages.join("\n\n"))
    }
}
