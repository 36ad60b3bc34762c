use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Embedding, RecordId};

pub type Metadata = Map<String, Value>;

/// A stored (vector, text, metadata) triple, unique by id within its collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub id: RecordId,
    pub embedding: Embedding,
    pub text: String,
    pub metadata: Metadata,
}

impl IndexedRecord {
    /// Creates a record whose metadata defaults to `{"source": <id>}`.
    pub fn new(id: RecordId, embedding: Embedding, text: String) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), Value::String(id.to_string()));
        Self {
            id,
            embedding,
            text,
            metadata,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        if !metadata.is_empty() {
            self.metadata = metadata;
        }
        self
    }
}

/// One nearest-neighbour hit. `similarity = 1 - distance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub text: String,
    pub similarity: f32,
}
