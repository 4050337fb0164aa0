//! Conversation memory
//!
//! Single shared dialogue history with:
//! - Two-tier capacity (message count + estimated bytes)
//! - Relevance-aware eviction (embedding cosine or lexical overlap)
//! - Budgeted context assembly for the generation prompt

mod context_builder;
pub mod pruner;
pub mod scorer;
mod store;
pub mod types;

pub use context_builder::{ContextBuilder, ENTRY_SEPARATOR};
pub use scorer::{EmbeddingScorer, LexicalScorer, RelevanceScorer};
pub use store::ConversationStore;
pub use types::{MemoryStats, Message, Role, StoreLimits};
