use async_trait::async_trait;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::{ContentType, Document};

use super::text_sanitizer::sanitize_extracted_text;

/// UTF-8 text and markdown.
pub struct PlainTextAdapter;

#[async_trait]
impl FileLoader for PlainTextAdapter {
    async fn extract_text(
        &self,
        data: &[u8],
        document: &Document,
    ) -> Result<String, FileLoaderError> {
        if document.content_type != ContentType::Text {
            return Err(FileLoaderError::UnsupportedContentType(
                document.content_type.as_mime().to_string(),
            ));
        }

        let raw = std::str::from_utf8(data)
            .map_err(|e| FileLoaderError::ExtractionFailed(format!("not valid UTF-8: {e}")))?;

        let text = sanitize_extracted_text(raw);
        if text.is_empty() {
            return Err(FileLoaderError::NoTextFound(document.filename.clone()));
        }
        Ok(text)
    }
}
