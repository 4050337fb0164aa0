use crate::config::RagConfig;
use crate::services::conversation::{ConversationStore, Role};
use crate::services::providers::{
    EmbeddingProvider, IndexedDocument, LlmProvider, SearchHit, VectorSearchProvider,
};
use crate::utils::error::ApiError;
use crate::utils::limiters::Limiters;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const NO_DOCUMENT_CONTEXT: &str = "No relevant information found.";

/// Answer produced for one chat turn
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SearchHit>,
    /// Similarity of the best matching document, 0 when none matched
    pub confidence: f32,
}

pub struct RagService {
    embedding: Option<Arc<dyn EmbeddingProvider>>,
    index: Arc<dyn VectorSearchProvider>,
    llm: Arc<dyn LlmProvider>,
    memory: Arc<ConversationStore>,
    limiters: Limiters,
    config: RagConfig,
    max_context_bytes: usize,
}

impl RagService {
    pub fn new(
        embedding: Option<Arc<dyn EmbeddingProvider>>,
        index: Arc<dyn VectorSearchProvider>,
        llm: Arc<dyn LlmProvider>,
        memory: Arc<ConversationStore>,
        limiters: Limiters,
        config: RagConfig,
        max_context_bytes: usize,
    ) -> Self {
        Self {
            embedding,
            index,
            llm,
            memory,
            limiters,
            config,
            max_context_bytes,
        }
    }

    pub fn memory(&self) -> &Arc<ConversationStore> {
        &self.memory
    }

    pub fn has_embeddings(&self) -> bool {
        self.embedding.is_some()
    }

    pub async fn document_count(&self) -> usize {
        self.index.len().await
    }

    /// Embed text through the shared embedding limiter
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let provider = self
            .embedding
            .as_ref()
            .ok_or_else(|| ApiError::EmbeddingError("Embedding provider is not configured".to_string()))?;

        let (_permit, waited) = Limiters::acquire_timed(
            self.limiters.embedding.clone(),
            self.limiters.acquire_timeout,
            "embed",
        )
        .await
        .map_err(|e| ApiError::Busy(e.to_string()))?;
        debug!("Embedding permit acquired after {:?}", waited);

        provider
            .embed(text)
            .await
            .map_err(|e| ApiError::EmbeddingError(e.to_string()))
    }

    /// Embed and store one reference document
    pub async fn index_document(&self, id: &str, text: &str, metadata: Value) -> Result<()> {
        let vector = self
            .embed(text)
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("Failed to embed document {}", id))?;

        let mut metadata = metadata;
        if let Value::Object(map) = &mut metadata {
            map.insert("text".to_string(), Value::String(text.to_string()));
        }

        self.index
            .add(IndexedDocument {
                id: id.to_string(),
                text: text.to_string(),
                vector,
                metadata,
            })
            .await?;

        info!("Indexed document {}", id);
        Ok(())
    }

    /// Index the startup corpus as `virtron_doc_{n}`; failures are logged and skipped
    pub async fn seed_documents(&self, documents: &[String]) -> usize {
        if !self.has_embeddings() {
            warn!("Embeddings disabled, skipping {} seed documents", documents.len());
            return 0;
        }

        let mut indexed = 0;
        for (i, text) in documents.iter().enumerate() {
            let id = format!("virtron_doc_{}", i + 1);
            match self.index_document(&id, text, json!({ "seed": true })).await {
                Ok(()) => indexed += 1,
                Err(e) => warn!("Error indexing document {}: {:#}", id, e),
            }
        }

        info!("Indexed {}/{} seed documents", indexed, documents.len());
        indexed
    }

    /// Top-k reference documents for the question
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>, ApiError> {
        if !self.has_embeddings() {
            return Ok(Vec::new());
        }

        let query_vector = self.embed(question).await?;
        let hits = self
            .index
            .search(&query_vector, self.config.retrieval_top_k)
            .await
            .map_err(|e| ApiError::VectorSearchError(e.to_string()))?;

        debug!("Retrieved {} documents", hits.len());
        Ok(hits)
    }

    /// Build context dari hits
    pub fn build_document_context(hits: &[SearchHit]) -> String {
        if hits.is_empty() {
            return NO_DOCUMENT_CONTEXT.to_string();
        }

        hits.iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn build_prompt(question: &str, document_context: &str, history: &str) -> String {
        let mut prompt = format!("Context: {}\n\n", document_context);

        if !history.is_empty() {
            prompt.push_str("Conversation history (most relevant first):\n");
            prompt.push_str(history);
            prompt.push('\n');
        }

        prompt.push_str(&format!("User Query: {}\nResponse:", question));
        prompt
    }

    /// Run one chat turn: retrieve, assemble history, generate, remember
    pub async fn answer(&self, question: &str) -> Result<RagAnswer, ApiError> {
        let start = Instant::now();
        info!("Answering question ({} chars)", question.len());

        let hits = self.retrieve(question).await?;
        let history = self
            .memory
            .relevant_context(question, self.max_context_bytes)
            .await;

        self.memory.add_message(Role::Query, question, question).await;

        let prompt = Self::build_prompt(question, &Self::build_document_context(&hits), &history);
        debug!(
            "Prompt built: {} bytes ({} history bytes, {} documents)",
            prompt.len(),
            history.len(),
            hits.len()
        );

        let (_permit, waited) = Limiters::acquire_timed(
            self.limiters.llm_generate.clone(),
            self.limiters.acquire_timeout,
            "generate",
        )
        .await
        .map_err(|e| ApiError::Busy(e.to_string()))?;
        debug!("Generation permit acquired after {:?}", waited);

        let answer = self
            .llm
            .generate(&prompt)
            .await
            .map_err(|e| ApiError::LlmError(e.to_string()))?;

        self.memory.add_message(Role::Response, answer.as_str(), question).await;

        let confidence = hits
            .first()
            .map(|hit| hit.score.clamp(0.0, 1.0))
            .unwrap_or(0.0);

        info!("Answer generated in {}ms", start.elapsed().as_millis());

        Ok(RagAnswer {
            answer,
            sources: hits,
            confidence,
        })
    }
}
