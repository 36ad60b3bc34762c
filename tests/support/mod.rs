use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use tokio::net::TcpListener;

use ragline::application::ports::{
    Embedder, EmbedderError, FileLoader, FileLoaderError, GenerationOptions, LlmClient,
    LlmClientError, LlmTokenStream, VectorStore, VectorStoreError,
};
use ragline::application::services::{DocumentChunker, RagService};
use ragline::domain::{Document, Embedding, IndexedRecord, QueryMatch, RecordId};
use ragline::infrastructure::text_processing::RecursiveCharacterSplitter;

pub const TEST_COLLECTION: &str = "test_documents";

/// Deterministic bag-of-bytes embedding so similar texts land close together.
pub fn toy_vector(text: &str) -> Vec<f32> {
    let mut values = vec![0.0; 8];
    for byte in text.to_lowercase().bytes().filter(u8::is_ascii_alphanumeric) {
        values[(byte % 8) as usize] += 1.0;
    }
    values
}

#[derive(Default)]
pub struct MockEmbedder {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl MockEmbedder {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbedderError::ApiRequestFailed {
                status: 503,
                body: "embedding model offline".to_string(),
            });
        }
        Ok(Embedding::normalized(toy_vector(text)))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Returns canned hits and records what it was asked to store.
#[derive(Default)]
pub struct StubVectorStore {
    pub hits: Vec<QueryMatch>,
    pub upserted: Mutex<Vec<IndexedRecord>>,
    pub queries: AtomicUsize,
}

impl StubVectorStore {
    pub fn with_hits(hits: Vec<(&str, f32)>) -> Self {
        Self {
            hits: hits
                .into_iter()
                .enumerate()
                .map(|(i, (text, similarity))| QueryMatch {
                    id: format!("doc_{i}"),
                    text: text.to_string(),
                    similarity,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn upsert_count(&self) -> usize {
        self.upserted.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl VectorStore for StubVectorStore {
    async fn upsert(
        &self,
        _collection: &str,
        records: &[IndexedRecord],
    ) -> Result<(), VectorStoreError> {
        self.upserted.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    async fn query(
        &self,
        _collection: &str,
        _embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }

    async fn count(&self, _collection: &str) -> Result<u64, VectorStoreError> {
        Ok(self.upsert_count() as u64)
    }

    async fn reset(&self, _collection: &str) -> Result<(), VectorStoreError> {
        self.upserted.lock().unwrap().clear();
        Ok(())
    }

    async fn delete(&self, _collection: &str, ids: &[RecordId]) -> Result<(), VectorStoreError> {
        self.upserted
            .lock()
            .unwrap()
            .retain(|r| !ids.contains(&r.id));
        Ok(())
    }
}

/// Plays back scripted answers in order, repeating the last one. A scripted
/// `Err(status)` becomes an HTTP failure.
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, u16>>>,
    last: Mutex<Result<String, u16>>,
    pub calls: AtomicUsize,
    pub seen_context: Mutex<Vec<Vec<String>>>,
}

impl MockLlmClient {
    pub fn answering(answer: &str) -> Self {
        Self::scripted(vec![Ok(answer.to_string())])
    }

    pub fn failing(status: u16) -> Self {
        Self::scripted(vec![Err(status)])
    }

    pub fn scripted(script: Vec<Result<String, u16>>) -> Self {
        let last = script
            .last()
            .cloned()
            .unwrap_or_else(|| Ok(String::new()));
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
            seen_context: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self, context: &[String]) -> Result<String, LlmClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_context.lock().unwrap().push(context.to_vec());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.lock().unwrap().clone());
        step.map_err(|status| LlmClientError::ApiRequestFailed {
            status,
            body: "model exploded".to_string(),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(
        &self,
        _question: &str,
        context: &[String],
        _options: &GenerationOptions,
    ) -> Result<String, LlmClientError> {
        self.next(context)
    }

    async fn generate_stream(
        &self,
        _question: &str,
        context: &[String],
        _options: &GenerationOptions,
    ) -> Result<LlmTokenStream, LlmClientError> {
        let answer = self.next(context)?;
        let fragments: Vec<Result<String, LlmClientError>> = answer
            .split_inclusive(' ')
            .map(|f| Ok(f.to_string()))
            .collect();
        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}

pub struct Utf8FileLoader;

#[async_trait::async_trait]
impl FileLoader for Utf8FileLoader {
    async fn extract_text(&self, data: &[u8], _doc: &Document) -> Result<String, FileLoaderError> {
        String::from_utf8(data.to_vec())
            .map_err(|e| FileLoaderError::ExtractionFailed(e.to_string()))
    }
}

pub fn chunker(chunk_size: usize, chunk_overlap: usize) -> DocumentChunker {
    DocumentChunker::new(
        Arc::new(Utf8FileLoader),
        Arc::new(RecursiveCharacterSplitter::new(chunk_size, chunk_overlap)),
    )
}

pub fn rag_service(
    embedder: Arc<MockEmbedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<MockLlmClient>,
) -> RagService {
    RagService::new(chunker(200, 20), embedder, store, llm, TEST_COLLECTION.to_string())
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
