pub mod settings;

pub use settings::{
    DocumentsConfig, EmbeddingConfig, LimitsConfig, LlmConfig, LoggingConfig, MemoryConfig,
    PromptsConfig, RagConfig, ServerConfig, Settings,
};
