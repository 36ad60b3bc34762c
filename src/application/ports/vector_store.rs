use async_trait::async_trait;

use super::VectorStoreError;
use crate::domain::{Embedding, IndexedRecord, QueryMatch, RecordId};

/// Nearest-neighbour storage keyed by collection name. Collections are
/// created on first use.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Adds or overwrites records by id. Not atomic across the batch.
    async fn upsert(
        &self,
        collection: &str,
        records: &[IndexedRecord],
    ) -> Result<(), VectorStoreError>;

    /// Up to `top_k` hits ordered by descending similarity. Empty when the
    /// collection holds nothing.
    async fn query(
        &self,
        collection: &str,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, VectorStoreError>;

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError>;

    /// Drops the collection and recreates it empty, all or nothing.
    async fn reset(&self, collection: &str) -> Result<(), VectorStoreError>;

    async fn delete(&self, collection: &str, ids: &[RecordId]) -> Result<(), VectorStoreError>;
}
