use std::fmt;

use uuid::Uuid;

/// A bounded segment of document text, ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub document_id: DocumentId,
    pub sequence_index: usize,
}

impl Chunk {
    pub fn new(
        text: String,
        source_id: String,
        document_id: DocumentId,
        sequence_index: usize,
    ) -> Self {
        Self {
            text,
            source_id,
            document_id,
            sequence_index,
        }
    }

    /// Deterministic record id: the same chunk of the same document always maps
    /// to the same id, so re-ingesting overwrites instead of duplicating.
    pub fn record_id(&self) -> RecordId {
        RecordId::new(format!(
            "doc_{}_{}",
            self.sequence_index,
            self.document_id.as_uuid()
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}
