mod local_vector_store;
mod qdrant_adapter;

pub use local_vector_store::LocalVectorStore;
pub use qdrant_adapter::QdrantAdapter;
