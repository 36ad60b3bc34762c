use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;
use crate::application::ports::GenerationOptions;
use crate::application::services::WorkflowPolicy;

const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub ollama: OllamaSettings,
    pub vector_store: VectorStoreSettings,
    pub chunking: ChunkingSettings,
    pub generation: GenerationSettings,
    pub workflow: WorkflowSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Built-in defaults, overlaid by `appsettings.<env>` (any format the
    /// `config` crate reads, optional) and then by `APP_*` variables using
    /// `__` between sections, e.g. `APP_OLLAMA__BASE_URL`.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
    /// Exposes error details in HTTP 500 bodies.
    pub debug: bool,
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_prefix: "/api/chat".to_string(),
            debug: false,
            cors_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub keep_alive: String,
    pub request_timeout_secs: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embedding_model: "mistral".to_string(),
            chat_model: "mistral".to_string(),
            keep_alive: "15m".to_string(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    #[default]
    Local,
    Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub provider: VectorStoreProvider,
    pub path: String,
    pub qdrant_url: String,
    pub collection_name: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Local,
            path: "./vector_db".to_string(),
            qdrant_url: "http://localhost:6334".to_string(),
            collection_name: "documents".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    #[default]
    Token,
    Character,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub strategy: ChunkingStrategy,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::Token,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
}

impl GenerationSettings {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt.clone(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            temperature: 0.7,
            max_tokens: 1000,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    pub min_answer_chars: usize,
    pub min_confidence: f32,
    pub max_retries: u32,
}

impl WorkflowSettings {
    pub fn policy(&self) -> WorkflowPolicy {
        WorkflowPolicy {
            min_answer_chars: self.min_answer_chars,
            min_confidence: self.min_confidence,
            max_retries: self.max_retries,
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            min_answer_chars: 10,
            min_confidence: 0.3,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
