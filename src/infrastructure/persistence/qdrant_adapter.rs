use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, PointId,
    PointStruct, PointsIdsList, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    VectorsConfig,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::ports::{VectorStore, VectorStoreError};
use crate::domain::{Embedding, IndexedRecord, QueryMatch, RecordId};

const RECORD_ID_FIELD: &str = "record_id";
const TEXT_FIELD: &str = "text";

/// Qdrant-backed store. Record ids are arbitrary strings, so each one is
/// mapped to a UUIDv5 point id and the original kept in the payload.
pub struct QdrantAdapter {
    client: Arc<Qdrant>,
}

impl QdrantAdapter {
    pub fn new(url: &str) -> Result<Self, VectorStoreError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub fn with_client(client: Arc<Qdrant>) -> Self {
        Self { client }
    }

    fn point_id(id: &RecordId) -> PointId {
        PointId::from(Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_str().as_bytes()).to_string())
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorStoreError> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))
    }

    async fn create_collection(
        &self,
        collection: &str,
        dimensions: u64,
    ) -> Result<(), VectorStoreError> {
        let vectors_config =
            VectorsConfig::from(VectorParamsBuilder::new(dimensions, Distance::Cosine));

        let created = self
            .client
            .create_collection(
                CreateCollectionBuilder::new(collection).vectors_config(vectors_config),
            )
            .await;

        if let Err(e) = created {
            // A concurrent writer may have won the race.
            if !self.collection_exists(collection).await? {
                return Err(VectorStoreError::UpsertFailed(e.to_string()));
            }
        }

        info!(collection, dimensions, "collection_created");
        Ok(())
    }

    async fn vector_size(&self, collection: &str) -> Result<Option<u64>, VectorStoreError> {
        if !self.collection_exists(collection).await? {
            return Ok(None);
        }

        let collection_info = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))?;

        let vector_size = collection_info
            .result
            .and_then(|result| result.config)
            .and_then(|config| config.params)
            .and_then(|params| params.vectors_config)
            .and_then(|vectors_config| match vectors_config.config {
                Some(qdrant_client::qdrant::vectors_config::Config::Params(params)) => {
                    Some(params.size)
                }
                _ => None,
            });

        Ok(vector_size)
    }

    fn check_dimensions(
        collection: &str,
        expected: u64,
        actual: usize,
    ) -> Result<(), VectorStoreError> {
        if expected as usize != actual {
            return Err(VectorStoreError::DimensionMismatch {
                collection: collection.to_string(),
                expected: expected as usize,
                actual,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantAdapter {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert(
        &self,
        collection: &str,
        records: &[IndexedRecord],
    ) -> Result<(), VectorStoreError> {
        let Some(first) = records.first() else {
            return Ok(());
        };

        let expected = match self.vector_size(collection).await? {
            Some(size) => size,
            None => {
                let size = first.embedding.dimensions() as u64;
                self.create_collection(collection, size).await?;
                size
            }
        };
        for record in records {
            Self::check_dimensions(collection, expected, record.embedding.dimensions())?;
        }

        let points: Vec<PointStruct> = records
            .iter()
            .map(|record| {
                let mut payload: HashMap<String, serde_json::Value> = record
                    .metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                payload.insert(
                    RECORD_ID_FIELD.to_string(),
                    serde_json::Value::String(record.id.to_string()),
                );
                payload.insert(
                    TEXT_FIELD.to_string(),
                    serde_json::Value::String(record.text.clone()),
                );

                PointStruct::new(
                    Self::point_id(&record.id),
                    record.embedding.values.clone(),
                    payload,
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| VectorStoreError::UpsertFailed(e.to_string()))?;

        info!(collection, count = records.len(), "points_upserted");
        Ok(())
    }

    #[instrument(skip(self, embedding))]
    async fn query(
        &self,
        collection: &str,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        let Some(expected) = self.vector_size(collection).await? else {
            return Ok(Vec::new());
        };
        Self::check_dimensions(collection, expected, embedding.dimensions())?;

        let search_result = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.values.clone(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| VectorStoreError::QueryFailed(e.to_string()))?;

        let matches = search_result
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload;
                let Some(id) = payload.get(RECORD_ID_FIELD).and_then(|v| v.as_str()) else {
                    warn!(collection, "point without record id skipped");
                    return None;
                };
                let text = payload
                    .get(TEXT_FIELD)
                    .and_then(|v| v.as_str())
                    .cloned()
                    .unwrap_or_default();

                Some(QueryMatch {
                    id: id.to_string(),
                    text,
                    similarity: point.score,
                })
            })
            .collect();

        Ok(matches)
    }

    #[instrument(skip(self))]
    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        if !self.collection_exists(collection).await? {
            return Ok(0);
        }

        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| VectorStoreError::CountFailed(e.to_string()))?;

        Ok(response.result.map_or(0, |r| r.count))
    }

    #[instrument(skip(self))]
    async fn reset(&self, collection: &str) -> Result<(), VectorStoreError> {
        let Some(size) = self.vector_size(collection).await? else {
            return Ok(());
        };

        self.client
            .delete_collection(collection)
            .await
            .map_err(|e| VectorStoreError::ResetFailed(e.to_string()))?;
        info!(collection, "collection_deleted");

        self.create_collection(collection, size)
            .await
            .map_err(|e| VectorStoreError::ResetFailed(e.to_string()))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete(&self, collection: &str, ids: &[RecordId]) -> Result<(), VectorStoreError> {
        if ids.is_empty() || !self.collection_exists(collection).await? {
            return Ok(());
        }

        let point_ids: Vec<PointId> = ids.iter().map(Self::point_id).collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(PointsIdsList { ids: point_ids })
                    .wait(true),
            )
            .await
            .map_err(|e| VectorStoreError::DeleteFailed(e.to_string()))?;

        info!(collection, count = ids.len(), "points_deleted");
        Ok(())
    }
}
