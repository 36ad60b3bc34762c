use ragline::domain::{ContentType, Document};

#[test]
fn given_pdf_mime_when_parsing_then_pdf() {
    assert_eq!(ContentType::from_mime("application/pdf"), Some(ContentType::Pdf));
}

#[test]
fn given_mime_with_parameters_when_parsing_then_parameters_ignored() {
    assert_eq!(
        ContentType::from_mime("text/plain; charset=utf-8"),
        Some(ContentType::Text)
    );
}

#[test]
fn given_generic_mime_when_detecting_then_falls_back_to_extension() {
    let detected = ContentType::detect(Some("application/octet-stream"), "Resume.PDF");

    assert_eq!(detected, Some(ContentType::Pdf));
}

#[test]
fn given_unknown_type_and_extension_when_detecting_then_none() {
    assert_eq!(ContentType::detect(Some("image/png"), "photo.png"), None);
    assert_eq!(ContentType::detect(None, "no_extension"), None);
}

#[test]
fn given_new_document_when_created_then_fields_populated() {
    let document = Document::new("notes.md".to_string(), ContentType::Text, 42);

    assert_eq!(document.filename, "notes.md");
    assert_eq!(document.content_type.as_mime(), "text/plain");
    assert_eq!(document.size_bytes, 42);
}
