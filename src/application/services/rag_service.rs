use std::sync::Arc;

use serde_json::Value;

use crate::application::ports::{
    Embedder, EmbedderError, GenerationOptions, LlmClient, LlmClientError, LlmTokenStream,
    VectorStore, VectorStoreError,
};
use crate::application::services::DocumentChunker;
use crate::domain::{
    AnswerResult, Chunk, Document, DocumentId, IndexedRecord, Metadata, NO_RELEVANT_INFORMATION,
    QueryMatch, RecordId, SourceExcerpt, confidence_of,
};

/// Per-request knobs for [`RagService::answer`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRequest {
    pub question: String,
    pub top_k: usize,
    pub options: GenerationOptions,
    pub include_sources: bool,
}

impl AnswerRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: 5,
            options: GenerationOptions::default(),
            include_sources: true,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn include_sources(mut self, include: bool) -> Self {
        self.include_sources = include;
        self
    }
}

/// Streaming counterpart of [`AnswerResult`]: retrieval is complete, the
/// answer text arrives through `tokens`.
pub struct AnswerStream {
    pub confidence: f32,
    pub sources: Vec<SourceExcerpt>,
    pub tokens: LlmTokenStream,
}

/// Chunk → embed → store on the way in; embed → retrieve → generate on the
/// way out. Owns confidence scoring and the no-results short-circuit.
pub struct RagService {
    chunker: DocumentChunker,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    llm_client: Arc<dyn LlmClient>,
    collection: String,
    defaults: AnswerRequest,
}

impl RagService {
    pub fn new(
        chunker: DocumentChunker,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        llm_client: Arc<dyn LlmClient>,
        collection: String,
    ) -> Self {
        Self {
            chunker,
            embedder,
            vector_store,
            llm_client,
            collection,
            defaults: AnswerRequest::new(String::new()),
        }
    }

    /// Overrides the top-k and generation options used by [`RagService::request`].
    pub fn with_defaults(mut self, top_k: usize, options: GenerationOptions) -> Self {
        self.defaults = self.defaults.with_top_k(top_k).with_options(options);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// An [`AnswerRequest`] carrying the configured defaults.
    pub fn request(&self, question: impl Into<String>) -> AnswerRequest {
        AnswerRequest {
            question: question.into(),
            ..self.defaults.clone()
        }
    }

    /// Stores every chunk of `document` and returns how many were stored.
    /// Documents with no extractable text store nothing and return 0.
    #[tracing::instrument(
        skip(self, data),
        fields(collection = %self.collection, filename = %document.filename)
    )]
    pub async fn ingest(&self, data: &[u8], document: &Document) -> Result<usize, IngestionError> {
        let chunks = self.chunker.load(data, document).await;
        self.store_chunks(chunks).await
    }

    /// Same as [`RagService::ingest`] for text that is already extracted.
    pub async fn ingest_text(&self, text: &str, source_id: &str) -> Result<usize, IngestionError> {
        let chunks = self
            .chunker
            .process(text, source_id, DocumentId::new())
            .await;
        self.store_chunks(chunks).await
    }

    async fn store_chunks(&self, chunks: Vec<Chunk>) -> Result<usize, IngestionError> {
        if chunks.is_empty() {
            tracing::info!("Nothing to ingest");
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(IngestionError::EmbeddingCountMismatch {
                expected: chunks.len(),
                actual: embeddings.len(),
            });
        }

        let records: Vec<IndexedRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let mut metadata = Metadata::new();
                metadata.insert("source".to_string(), Value::String(chunk.source_id.clone()));
                metadata.insert(
                    "document_id".to_string(),
                    Value::String(chunk.document_id.as_uuid().to_string()),
                );
                metadata.insert(
                    "sequence_index".to_string(),
                    Value::from(chunk.sequence_index as u64),
                );
                IndexedRecord::new(chunk.record_id(), embedding, chunk.text).with_metadata(metadata)
            })
            .collect();

        self.vector_store.upsert(&self.collection, &records).await?;

        tracing::info!(chunk_count = records.len(), "Document ingested");
        Ok(records.len())
    }

    /// Nearest chunks for `question`, in the store's order.
    pub async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, RetrievalError> {
        let query_embedding = self.embedder.embed(question).await?;

        let hits = self
            .vector_store
            .query(&self.collection, &query_embedding, top_k)
            .await?;

        tracing::debug!(hit_count = hits.len(), top_k, "Retrieved context");
        Ok(hits)
    }

    #[tracing::instrument(
        skip(self, request),
        fields(collection = %self.collection, top_k = request.top_k)
    )]
    pub async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResult, RetrievalError> {
        let hits = self.retrieve(&request.question, request.top_k).await?;
        if hits.is_empty() {
            return Ok(AnswerResult::no_relevant_information());
        }

        let context: Vec<String> = hits.iter().map(|h| h.text.clone()).collect();
        let answer = self
            .llm_client
            .generate(&request.question, &context, &request.options)
            .await?;

        let sources = if request.include_sources {
            hits.iter().map(SourceExcerpt::from_match).collect()
        } else {
            Vec::new()
        };

        Ok(AnswerResult {
            answer,
            confidence: confidence_of(&hits),
            sources,
        })
    }

    pub async fn answer_stream(
        &self,
        request: &AnswerRequest,
    ) -> Result<AnswerStream, RetrievalError> {
        let hits = self.retrieve(&request.question, request.top_k).await?;
        if hits.is_empty() {
            return Ok(AnswerStream {
                confidence: 0.0,
                sources: Vec::new(),
                tokens: Box::pin(futures::stream::once(async {
                    Ok(NO_RELEVANT_INFORMATION.to_string())
                })),
            });
        }

        let context: Vec<String> = hits.iter().map(|h| h.text.clone()).collect();
        let tokens = self
            .llm_client
            .generate_stream(&request.question, &context, &request.options)
            .await?;

        let sources = if request.include_sources {
            hits.iter().map(SourceExcerpt::from_match).collect()
        } else {
            Vec::new()
        };

        Ok(AnswerStream {
            confidence: confidence_of(&hits),
            sources,
            tokens,
        })
    }

    pub async fn count(&self) -> Result<u64, VectorStoreError> {
        self.vector_store.count(&self.collection).await
    }

    /// Removes the given records from the collection. Unknown ids are ignored.
    pub async fn delete(&self, ids: &[RecordId]) -> Result<(), VectorStoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        tracing::info!(collection = %self.collection, id_count = ids.len(), "Deleting records");
        self.vector_store.delete(&self.collection, ids).await
    }

    pub async fn reset(&self) -> Result<(), VectorStoreError> {
        tracing::info!(collection = %self.collection, "Resetting collection");
        self.vector_store.reset(&self.collection).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("embedding: {0}")]
    Embedding(#[from] EmbedderError),
    #[error("embedding returned {actual} vectors for {expected} chunks")]
    EmbeddingCountMismatch { expected: usize, actual: usize },
    #[error("storage: {0}")]
    Storage(#[from] VectorStoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("embedding: {0}")]
    Embedding(#[from] EmbedderError),
    #[error("search: {0}")]
    Search(#[from] VectorStoreError),
    #[error("generation: {0}")]
    Generation(#[from] LlmClientError),
}
