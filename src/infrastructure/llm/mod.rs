mod ollama_client;
mod ollama_embedder;

pub use ollama_client::OllamaClient;
pub use ollama_embedder::OllamaEmbedder;
