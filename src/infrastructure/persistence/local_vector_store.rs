use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::application::ports::{VectorStore, VectorStoreError};
use crate::domain::{Embedding, IndexedRecord, Metadata, QueryMatch, RecordId};

/// Disk-backed vector store with exact cosine search.
///
/// Each collection is one JSON snapshot at `<root>/<collection>.json`, loaded
/// on first access and rewritten through a temp file + rename on every
/// mutation, so a crash leaves either the old or the new snapshot. The
/// in-memory copy only changes once the new snapshot is on disk.
pub struct LocalVectorStore {
    root: PathBuf,
    collections: RwLock<HashMap<String, Collection>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collection {
    dimensions: Option<usize>,
    records: Vec<StoredRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    embedding: Embedding,
    text: String,
    metadata: Metadata,
}

impl Collection {
    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

impl LocalVectorStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, VectorStoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!(path = %root.display(), "Local vector store opened");
        Ok(Self {
            root,
            collections: RwLock::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn snapshot_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }

    fn check_name(collection: &str) -> Result<(), VectorStoreError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(())
        } else {
            Err(VectorStoreError::InvalidCollection(collection.to_string()))
        }
    }

    async fn read_snapshot(&self, collection: &str) -> Result<Collection, VectorStoreError> {
        match tokio::fs::read(self.snapshot_path(collection)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Collection::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_snapshot(
        &self,
        name: &str,
        collection: &Collection,
    ) -> Result<(), VectorStoreError> {
        let bytes = serde_json::to_vec(collection)?;
        let target = self.snapshot_path(name);
        let staging = self.root.join(format!("{name}.json.tmp"));

        let written = match tokio::fs::write(&staging, bytes).await {
            Ok(()) => tokio::fs::rename(&staging, &target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(
                        path = %staging.display(),
                        error = %cleanup,
                        "Stale snapshot left behind"
                    );
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn ensure_loaded(&self, collection: &str) -> Result<(), VectorStoreError> {
        Self::check_name(collection)?;
        if self.collections.read().await.contains_key(collection) {
            return Ok(());
        }

        let mut collections = self.collections.write().await;
        if !collections.contains_key(collection) {
            let loaded = self.read_snapshot(collection).await?;
            debug!(collection, records = loaded.records.len(), "Collection loaded");
            collections.insert(collection.to_string(), loaded);
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert(
        &self,
        collection: &str,
        records: &[IndexedRecord],
    ) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }
        self.ensure_loaded(collection).await?;

        let mut collections = self.collections.write().await;
        let mut next = collections.get(collection).cloned().unwrap_or_default();

        let expected = next
            .dimensions
            .unwrap_or_else(|| records[0].embedding.dimensions());
        if let Some(bad) = records
            .iter()
            .find(|r| r.embedding.dimensions() != expected)
        {
            return Err(VectorStoreError::DimensionMismatch {
                collection: collection.to_string(),
                expected,
                actual: bad.embedding.dimensions(),
            });
        }
        next.dimensions = Some(expected);

        for record in records {
            let stored = StoredRecord {
                id: record.id.to_string(),
                embedding: record.embedding.clone(),
                text: record.text.clone(),
                metadata: record.metadata.clone(),
            };
            match next.position(record.id.as_str()) {
                Some(idx) => next.records[idx] = stored,
                None => next.records.push(stored),
            }
        }

        self.write_snapshot(collection, &next).await?;
        collections.insert(collection.to_string(), next);
        info!(collection, count = records.len(), "Records upserted");
        Ok(())
    }

    #[instrument(skip(self, embedding))]
    async fn query(
        &self,
        collection: &str,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        self.ensure_loaded(collection).await?;

        let collections = self.collections.read().await;
        let Some(entry) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        if let Some(expected) = entry.dimensions {
            if expected != embedding.dimensions() {
                return Err(VectorStoreError::DimensionMismatch {
                    collection: collection.to_string(),
                    expected,
                    actual: embedding.dimensions(),
                });
            }
        }

        let mut scored: Vec<(f32, &StoredRecord)> = entry
            .records
            .iter()
            .map(|record| (record.embedding.cosine_distance(embedding), record))
            .collect();

        // Stable: equal distances keep insertion order.
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(distance, record)| QueryMatch {
                id: record.id.clone(),
                text: record.text.clone(),
                similarity: 1.0 - distance,
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        self.ensure_loaded(collection).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map_or(0, |c| c.records.len() as u64))
    }

    #[instrument(skip(self))]
    async fn reset(&self, collection: &str) -> Result<(), VectorStoreError> {
        Self::check_name(collection)?;
        let mut collections = self.collections.write().await;

        let empty = Collection::default();
        self.write_snapshot(collection, &empty).await?;
        collections.insert(collection.to_string(), empty);

        info!(collection, "Collection reset");
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete(&self, collection: &str, ids: &[RecordId]) -> Result<(), VectorStoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.ensure_loaded(collection).await?;

        let mut collections = self.collections.write().await;
        let Some(current) = collections.get(collection) else {
            return Ok(());
        };

        let mut next = current.clone();
        next.records
            .retain(|r| !ids.iter().any(|id| id.as_str() == r.id));
        let removed = current.records.len() - next.records.len();
        if removed == 0 {
            return Ok(());
        }

        self.write_snapshot(collection, &next).await?;
        collections.insert(collection.to_string(), next);

        info!(collection, removed, "Records deleted");
        Ok(())
    }
}
