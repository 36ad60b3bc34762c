use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::StreamExt;
use serde_json::json;
use tempfile::TempDir;

use ragline::application::ports::VectorStore;
use ragline::application::services::{IngestionError, RetrievalError};
use ragline::domain::{ContentType, Document, NO_RELEVANT_INFORMATION};
use ragline::infrastructure::persistence::LocalVectorStore;

use crate::support::{MockEmbedder, MockLlmClient, StubVectorStore, TEST_COLLECTION, rag_service};

fn paragraph(word: &str) -> String {
    format!("{word} ").repeat(25).trim_end().to_string()
}

fn three_paragraphs() -> String {
    [paragraph("alpha"), paragraph("bravo"), paragraph("delta")].join("\n\n")
}

#[tokio::test]
async fn given_no_hits_when_answering_then_fallback_without_generation() {
    let store = Arc::new(StubVectorStore::default());
    let llm = Arc::new(MockLlmClient::answering("should never be used"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm.clone());

    let result = service.answer(&service.request("anything?")).await.unwrap();

    assert_eq!(result.answer, NO_RELEVANT_INFORMATION);
    assert_eq!(result.confidence, 0.0);
    assert!(result.sources.is_empty());
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn given_unordered_similarities_when_answering_then_confidence_is_max() {
    let store = Arc::new(StubVectorStore::with_hits(vec![
        ("t1", 0.9),
        ("t2", 0.95),
        ("t3", 0.3),
    ]));
    let llm = Arc::new(MockLlmClient::answering("The answer is in t2."));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm.clone());

    let result = service.answer(&service.request("question")).await.unwrap();

    assert_eq!(result.confidence, 0.95);
    assert_eq!(result.answer, "The answer is in t2.");
    let order: Vec<f32> = result.sources.iter().map(|s| s.similarity).collect();
    assert_eq!(order, vec![0.9, 0.95, 0.3]);
    assert_eq!(llm.call_count(), 1);
    assert_eq!(llm.seen_context.lock().unwrap()[0], vec!["t1", "t2", "t3"]);
}

#[tokio::test]
async fn given_sources_disabled_when_answering_then_sources_empty() {
    let store = Arc::new(StubVectorStore::with_hits(vec![("passage", 0.8)]));
    let llm = Arc::new(MockLlmClient::answering("answer"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm);

    let request = service.request("q").include_sources(false);
    let result = service.answer(&request).await.unwrap();

    assert!(result.sources.is_empty());
    assert_eq!(result.confidence, 0.8);
}

#[tokio::test]
async fn given_long_passage_when_answering_then_source_is_truncated() {
    let long = "x".repeat(300);
    let store = Arc::new(StubVectorStore::with_hits(vec![(long.as_str(), 0.7)]));
    let llm = Arc::new(MockLlmClient::answering("answer"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm);

    let result = service.answer(&service.request("q")).await.unwrap();

    assert_eq!(result.sources[0].excerpt, format!("{}...", "x".repeat(200)));
}

#[tokio::test]
async fn given_top_k_when_answering_then_at_most_top_k_sources() {
    let store = Arc::new(StubVectorStore::with_hits(vec![
        ("a", 0.9),
        ("b", 0.8),
        ("c", 0.7),
        ("d", 0.6),
    ]));
    let llm = Arc::new(MockLlmClient::answering("answer"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm);

    let result = service
        .answer(&service.request("q").with_top_k(2))
        .await
        .unwrap();

    assert_eq!(result.sources.len(), 2);
}

#[tokio::test]
async fn given_generation_failure_when_answering_then_generation_error() {
    let store = Arc::new(StubVectorStore::with_hits(vec![("passage", 0.8)]));
    let llm = Arc::new(MockLlmClient::failing(500));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm);

    let err = service.answer(&service.request("q")).await.unwrap_err();

    assert!(matches!(err, RetrievalError::Generation(_)));
    assert!(err.to_string().contains("HTTP 500"));
    let source = std::error::Error::source(&err).expect("port error kept as source");
    assert!(source.to_string().contains("HTTP 500"));
}

#[tokio::test]
async fn given_document_without_text_when_ingesting_then_zero_and_no_calls() {
    let embedder = Arc::new(MockEmbedder::default());
    let store = Arc::new(StubVectorStore::default());
    let llm = Arc::new(MockLlmClient::answering("unused"));
    let service = rag_service(embedder.clone(), store.clone(), llm);
    let document = Document::new("empty.txt".to_string(), ContentType::Text, 3);

    let count = service.ingest(b"  \n", &document).await.unwrap();

    assert_eq!(count, 0);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.upsert_count(), 0);
}

#[tokio::test]
async fn given_embedding_failure_when_ingesting_then_nothing_stored() {
    let store = Arc::new(StubVectorStore::default());
    let llm = Arc::new(MockLlmClient::answering("unused"));
    let service = rag_service(Arc::new(MockEmbedder::failing()), store.clone(), llm);

    let err = service.ingest_text(&three_paragraphs(), "doc.txt").await.unwrap_err();

    assert!(matches!(err, IngestionError::Embedding(_)));
    assert_eq!(store.upsert_count(), 0);
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn given_document_when_ingesting_then_records_carry_metadata() {
    let store = Arc::new(StubVectorStore::default());
    let llm = Arc::new(MockLlmClient::answering("unused"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store.clone(), llm);
    let document = Document::new("guide.txt".to_string(), ContentType::Text, 0);

    let count = service
        .ingest(three_paragraphs().as_bytes(), &document)
        .await
        .unwrap();

    let records = store.upserted.lock().unwrap();
    assert_eq!(records.len(), count);
    let first = &records[0];
    assert_eq!(
        first.id.as_str(),
        format!("doc_0_{}", document.id.as_uuid())
    );
    assert_eq!(first.metadata.get("source"), Some(&json!("guide.txt")));
    assert_eq!(first.metadata.get("sequence_index"), Some(&json!(0)));
    assert_eq!(
        first.metadata.get("document_id"),
        Some(&json!(document.id.as_uuid().to_string()))
    );
}

#[tokio::test]
async fn given_three_chunk_document_when_ingested_then_count_and_answer_reflect_it() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn VectorStore> = Arc::new(LocalVectorStore::open(dir.path()).await.unwrap());
    let llm = Arc::new(MockLlmClient::answering("Alpha is repeated throughout the first part."));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm);
    let document = Document::new("three.txt".to_string(), ContentType::Text, 0);

    let stored = service
        .ingest(three_paragraphs().as_bytes(), &document)
        .await
        .unwrap();
    assert_eq!(stored, 3);
    assert_eq!(service.count().await.unwrap(), 3);

    let request = service.request("alpha").with_top_k(2);
    let result = service.answer(&request).await.unwrap();

    assert!(!result.answer.is_empty());
    assert!(result.confidence > 0.0);
    assert!(result.sources.len() <= 2);
    for source in &result.sources {
        assert!((-1.0..=1.0).contains(&source.similarity));
    }
    assert!(result.sources[0].excerpt.contains("alpha"));
}

#[tokio::test]
async fn given_reingested_document_when_counting_then_records_overwritten() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn VectorStore> = Arc::new(LocalVectorStore::open(dir.path()).await.unwrap());
    let llm = Arc::new(MockLlmClient::answering("unused"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm);
    let document = Document::new("three.txt".to_string(), ContentType::Text, 0);

    service.ingest(three_paragraphs().as_bytes(), &document).await.unwrap();
    service.ingest(three_paragraphs().as_bytes(), &document).await.unwrap();

    assert_eq!(service.count().await.unwrap(), 3);
    assert_eq!(service.collection(), TEST_COLLECTION);
}

#[tokio::test]
async fn given_no_hits_when_streaming_then_single_fallback_fragment() {
    let store = Arc::new(StubVectorStore::default());
    let llm = Arc::new(MockLlmClient::answering("unused"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm.clone());

    let stream = service.answer_stream(&service.request("q")).await.unwrap();
    let fragments: Vec<String> = stream.tokens.map(|t| t.unwrap()).collect().await;

    assert_eq!(fragments, vec![NO_RELEVANT_INFORMATION.to_string()]);
    assert_eq!(stream.confidence, 0.0);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn given_hits_when_streaming_then_fragments_rebuild_answer() {
    let store = Arc::new(StubVectorStore::with_hits(vec![("passage", 0.6)]));
    let llm = Arc::new(MockLlmClient::answering("streamed answer text"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm);

    let stream = service.answer_stream(&service.request("q")).await.unwrap();
    let confidence = stream.confidence;
    let text: String = stream.tokens.map(|t| t.unwrap()).collect::<Vec<_>>().await.concat();

    assert_eq!(text, "streamed answer text");
    assert_eq!(confidence, 0.6);
}

#[tokio::test]
async fn given_stored_records_when_reset_then_count_is_zero() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn VectorStore> = Arc::new(LocalVectorStore::open(dir.path()).await.unwrap());
    let llm = Arc::new(MockLlmClient::answering("unused"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store, llm);
    service.ingest_text(&three_paragraphs(), "doc.txt").await.unwrap();

    service.reset().await.unwrap();

    assert_eq!(service.count().await.unwrap(), 0);
}

#[tokio::test]
async fn given_ingested_chunks_when_deleting_one_then_only_it_is_removed() {
    let store = Arc::new(StubVectorStore::default());
    let llm = Arc::new(MockLlmClient::answering("unused"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store.clone(), llm);
    let stored = service.ingest_text(&three_paragraphs(), "doc.txt").await.unwrap();
    let doomed = store.upserted.lock().unwrap()[0].id.clone();

    service.delete(std::slice::from_ref(&doomed)).await.unwrap();

    assert_eq!(service.count().await.unwrap(), stored as u64 - 1);
    assert!(store.upserted.lock().unwrap().iter().all(|r| r.id != doomed));
}

#[tokio::test]
async fn given_no_ids_when_deleting_then_collection_untouched() {
    let store = Arc::new(StubVectorStore::default());
    let llm = Arc::new(MockLlmClient::answering("unused"));
    let service = rag_service(Arc::new(MockEmbedder::default()), store.clone(), llm);
    let stored = service.ingest_text(&three_paragraphs(), "doc.txt").await.unwrap();

    service.delete(&[]).await.unwrap();

    assert_eq!(service.count().await.unwrap(), stored as u64);
}
