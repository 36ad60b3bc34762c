mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    ChunkingSettings, ChunkingStrategy, GenerationSettings, LoggingSettings, OllamaSettings,
    ServerSettings, Settings, VectorStoreProvider, VectorStoreSettings, WorkflowSettings,
};
