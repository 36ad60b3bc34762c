use std::sync::Arc;

use ragline::application::ports::{FileLoader, FileLoaderError};
use ragline::domain::{ContentType, Document};
use ragline::infrastructure::text_processing::{CompositeFileLoader, PlainTextAdapter};

fn text_only() -> CompositeFileLoader {
    let text: Arc<dyn FileLoader> = Arc::new(PlainTextAdapter);
    CompositeFileLoader::new(vec![(ContentType::Text, text)])
}

#[tokio::test]
async fn given_registered_type_when_extracted_then_delegated_to_loader() {
    let loader = text_only();
    let document = Document::new("a.txt".to_string(), ContentType::Text, 11);

    let text = loader.extract_text(b"hello  world", &document).await.unwrap();

    assert_eq!(text, "hello world");
}

#[tokio::test]
async fn given_unregistered_type_when_extracted_then_unsupported() {
    let loader = text_only();
    let document = Document::new("a.pdf".to_string(), ContentType::Pdf, 4);

    let err = loader.extract_text(b"%PDF", &document).await.unwrap_err();

    assert!(matches!(
        err,
        FileLoaderError::UnsupportedContentType(mime) if mime == "application/pdf"
    ));
}

#[test]
fn given_default_loaders_when_checked_then_pdf_and_text_supported() {
    let loader = CompositeFileLoader::with_defaults();

    assert!(loader.supports(ContentType::Pdf));
    assert!(loader.supports(ContentType::Text));
    assert!(!text_only().supports(ContentType::Pdf));
}

#[tokio::test]
async fn given_garbage_pdf_bytes_when_extracted_then_error() {
    let loader = CompositeFileLoader::with_defaults();
    let document = Document::new("fake.pdf".to_string(), ContentType::Pdf, 13);

    let result = loader.extract_text(b"not a pdf at all", &document).await;

    assert!(result.is_err());
}
