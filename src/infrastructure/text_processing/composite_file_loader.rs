use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::{ContentType, Document};

use super::{PdfAdapter, PlainTextAdapter};

/// Routes each document to the loader registered for its content type.
pub struct CompositeFileLoader {
    loaders: HashMap<ContentType, Arc<dyn FileLoader>>,
}

impl CompositeFileLoader {
    pub fn new(loaders: Vec<(ContentType, Arc<dyn FileLoader>)>) -> Self {
        Self {
            loaders: loaders.into_iter().collect(),
        }
    }

    /// PDF and plain text, the formats accepted on upload.
    pub fn with_defaults() -> Self {
        let pdf: Arc<dyn FileLoader> = Arc::new(PdfAdapter::new());
        let text: Arc<dyn FileLoader> = Arc::new(PlainTextAdapter);
        Self::new(vec![(ContentType::Pdf, pdf), (ContentType::Text, text)])
    }

    pub fn supports(&self, content_type: ContentType) -> bool {
        self.loaders.contains_key(&content_type)
    }
}

#[async_trait]
impl FileLoader for CompositeFileLoader {
    async fn extract_text(
        &self,
        data: &[u8],
        document: &Document,
    ) -> Result<String, FileLoaderError> {
        let loader = self.loaders.get(&document.content_type).ok_or_else(|| {
            FileLoaderError::UnsupportedContentType(document.content_type.as_mime().to_string())
        })?;

        loader.extract_text(data, document).await
    }
}
