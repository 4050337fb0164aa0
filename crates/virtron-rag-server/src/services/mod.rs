pub mod conversation;
pub mod embedding_service;
pub mod llm_service;
pub mod providers;
pub mod rag_service;
pub mod vector_index;

pub use embedding_service::EmbeddingService;
pub use llm_service::LlmService;
pub use providers::{EmbeddingProvider, LlmProvider, VectorSearchProvider};
pub use rag_service::{RagAnswer, RagService};
pub use vector_index::InMemoryVectorIndex;
