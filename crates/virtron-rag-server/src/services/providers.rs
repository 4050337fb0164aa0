//! Capability traits for the remote collaborators of the chat pipeline.
//!
//! Concrete HTTP-backed implementations live next to this module
//! (`EmbeddingService`, `LlmService`); the vector index is in-process.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// Trait for embedding service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Trait for LLM service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Document stored in the vector index
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: Value,
}

/// Ranked result from vector search
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: Value,
    pub score: f32,
}

/// Trait for the reference document index
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VectorSearchProvider: Send + Sync {
    async fn add(&self, document: IndexedDocument) -> Result<()>;

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;

    async fn len(&self) -> usize;
}
