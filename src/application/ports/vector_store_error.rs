#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("invalid collection name: {0}")]
    InvalidCollection(String),
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("upsert failed: {0}")]
    UpsertFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("count failed: {0}")]
    CountFailed(String),
    #[error("reset failed: {0}")]
    ResetFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("dimension mismatch in '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
