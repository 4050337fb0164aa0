use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SETTINGS_FILE: &str = "config/settings";
const MIB: usize = 1024 * 1024;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub rag: RagConfig,
    pub memory: MemoryConfig,
    pub logging: LoggingConfig,
    pub limits: LimitsConfig,
    pub prompts: PromptsConfig,
    pub documents: DocumentsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding index.html and the frontend scripts
    pub static_dir: String,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            static_dir: "public".to_string(),
            body_limit_bytes: 2 * MIB,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// When false, memory falls back to lexical scoring and no documents are indexed
    pub enabled: bool,
    pub model: String,
    pub base_url: String,
    pub dimension: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "nomic-embed-text".to_string(),
            base_url: "http://localhost:11434".to_string(),
            dimension: 768,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "gemma3:1b".to_string(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RagConfig {
    pub retrieval_top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { retrieval_top_k: 3 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    pub max_size_bytes: usize,
    pub max_message_count: usize,
    /// Byte budget for the history block handed to the generator
    pub max_context_bytes: usize,
    pub embedding_timeout_ms: u64,
    pub embedding_concurrency: usize,
    /// Prune after appending so the count limit is never exceeded
    pub strict_count_limit: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 5 * MIB,
            max_message_count: 20,
            max_context_bytes: MIB,
            embedding_timeout_ms: 3_000,
            embedding_concurrency: 8,
            strict_count_limit: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// "json" or "pretty"
    pub format: String,
    /// Directory for the daily rolling log file; stdout only when unset
    pub directory: Option<String>,
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            directory: None,
            default_filter: "info,virtron_rag_server=debug".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub embedding_concurrency: usize,
    pub llm_generate_concurrency: usize,
    pub acquire_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            embedding_concurrency: 8,
            llm_generate_concurrency: 2,
            acquire_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PromptsConfig {
    pub system_prompt: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are Virtron AI, a helpful assistant explaining the Virtron Metaverse.\n\
                Provide a concise, direct response based on the context.\n\
                Be informative but not overly verbose."
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Reference documents embedded and indexed at startup
    pub seed: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            seed: vec![
                "Virtron Metaverse is a virtual world where users can create, explore, and interact with various environments and experiences. It focuses on user-generated content and community-driven development.".to_string(),
                "The Virtron Metaverse economy is powered by the Virtron token, which allows users to buy, sell, and trade virtual assets, land, and experiences. It also enables participation in governance and decision-making within the metaverse.".to_string(),
                "Users in Virtron can build complex 3D environments, create unique avatars, and participate in community events and collaborative projects.".to_string(),
                "The platform supports multiple interaction modes including voice chat, text communication, and gesture-based interactions.".to_string(),
                "Developers can create and monetize their own virtual experiences, games, and applications within the Virtron ecosystem.".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Load `config/settings.toml` (optional), then `APP__*` environment overrides
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn config_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.toml", SETTINGS_FILE))
    }
}
