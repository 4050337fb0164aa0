use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::utils::size_estimator;

use super::context_builder::ContextBuilder;
use super::pruner;
use super::scorer::RelevanceScorer;
use super::types::{MemoryStats, Message, Role, StoreLimits};

/// Bounded dialogue history shared by every chat request.
///
/// Mutations hold the write lock across scoring, pruning and appending, so
/// concurrent `add_message` calls never interleave. `relevant_context` takes
/// the read lock and may run alongside other readers.
pub struct ConversationStore {
    messages: RwLock<Vec<Message>>,
    limits: StoreLimits,
    scorer: RelevanceScorer,
}

impl ConversationStore {
    pub fn new(limits: StoreLimits, scorer: RelevanceScorer) -> Self {
        info!(
            "Initializing conversation store: max_messages={}, max_bytes={}, strategy={}, strict={}",
            limits.max_message_count,
            limits.max_size_bytes,
            scorer.strategy_name(),
            limits.strict_count_limit
        );

        Self {
            messages: RwLock::new(Vec::new()),
            limits,
            scorer,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.scorer.strategy_name()
    }

    /// Record a dialogue turn, evicting the least relevant history when over capacity.
    ///
    /// Eviction runs before the append, so a store at its count limit briefly
    /// holds one extra message. With `strict_count_limit` the new message is
    /// scored together with the history and evictions are applied with the
    /// append, so the bound is exact even if the call is cancelled.
    pub async fn add_message(&self, role: Role, text: impl Into<String>, reference_context: &str) {
        let message = Message::new(role, text);
        let new_bytes = message.estimated_bytes();

        let mut messages = self.messages.write().await;

        if self.limits.strict_count_limit {
            let mut texts: Vec<&str> = messages.iter().map(|m| m.text()).collect();
            texts.push(message.text());
            let evict = pruner::plan_evictions(
                &self.scorer,
                &texts,
                reference_context,
                self.limits.max_message_count,
            )
            .await;

            messages.push(message);
            pruner::remove_indices(&mut messages, &evict);
        } else {
            let current_bytes = size_estimator::estimate_total(&messages);
            let over_size =
                size_estimator::would_exceed_limit(current_bytes, new_bytes, self.limits.max_size_bytes);
            let over_count = messages.len() > self.limits.max_message_count;

            if over_size || over_count {
                debug!(
                    "Capacity check tripped (bytes {} + {} > {}: {}, count {} > {}: {})",
                    current_bytes,
                    new_bytes,
                    self.limits.max_size_bytes,
                    over_size,
                    messages.len(),
                    self.limits.max_message_count,
                    over_count
                );
                pruner::prune(
                    &self.scorer,
                    &mut messages,
                    reference_context,
                    self.limits.max_message_count,
                )
                .await;
            }

            messages.push(message);
        }

        debug!(
            "Stored {} message ({} bytes), history now {} messages",
            role.as_str(),
            new_bytes,
            messages.len()
        );
    }

    /// Most relevant history for `query`, packed into at most `max_context_size` bytes
    pub async fn relevant_context(&self, query: &str, max_context_size: usize) -> String {
        let messages = self.messages.read().await;
        ContextBuilder::assemble(&self.scorer, &messages, query, max_context_size).await
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Estimated total byte size, recomputed from current contents
    pub async fn total_bytes(&self) -> usize {
        size_estimator::estimate_total(&self.messages.read().await)
    }

    /// Copy of the history, oldest first
    pub async fn snapshot(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    pub async fn stats(&self) -> MemoryStats {
        let messages = self.messages.read().await;
        MemoryStats {
            message_count: messages.len(),
            total_bytes: size_estimator::estimate_total(&messages),
            max_message_count: self.limits.max_message_count,
            max_size_bytes: self.limits.max_size_bytes,
            strategy: self.scorer.strategy_name(),
        }
    }

    pub async fn clear(&self) {
        let mut messages = self.messages.write().await;
        let removed = messages.len();
        messages.clear();
        info!("Cleared {} messages from conversation memory", removed);
    }
}
