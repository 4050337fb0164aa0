use tracing::debug;

use super::scorer::RelevanceScorer;
use super::types::Message;

/// Line written after every serialized message
pub const ENTRY_SEPARATOR: &str = "\n";

/// Builds the bounded history block handed to the generator
pub struct ContextBuilder;

impl ContextBuilder {
    /// Compact JSON form of a message followed by the separator
    pub fn serialize_entry(message: &Message) -> String {
        let body = serde_json::to_string(message).unwrap_or_else(|_| {
            serde_json::json!({ "role": message.role().as_str(), "text": message.text() }).to_string()
        });
        format!("{}{}", body, ENTRY_SEPARATOR)
    }

    /// Indices sorted by descending score. Ties keep the oldest message first.
    pub fn rank(scores: &[f32]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order
    }

    /// Greedy prefix: stop at the first entry that would exceed `max_bytes`
    pub fn select_greedy<I>(entries: I, max_bytes: usize) -> String
    where
        I: IntoIterator<Item = String>,
    {
        let mut context = String::new();

        for entry in entries {
            if context.len() + entry.len() > max_bytes {
                debug!(
                    "Context budget reached at {} bytes (next entry {} bytes, max {})",
                    context.len(),
                    entry.len(),
                    max_bytes
                );
                break;
            }
            context.push_str(&entry);
        }

        context
    }

    /// Rank `messages` against `query` and pack them into `max_bytes`
    pub async fn assemble(
        scorer: &RelevanceScorer,
        messages: &[Message],
        query: &str,
        max_bytes: usize,
    ) -> String {
        if messages.is_empty() {
            return String::new();
        }

        let texts: Vec<&str> = messages.iter().map(|m| m.text()).collect();
        let scores = scorer.score_all(query, &texts).await;
        let ranked = Self::rank(&scores);

        let context = Self::select_greedy(
            ranked.into_iter().map(|i| Self::serialize_entry(&messages[i])),
            max_bytes,
        );

        debug!(
            "Assembled {} bytes of conversation context from {} messages",
            context.len(),
            messages.len()
        );

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_entry_ends_with_separator() {
        let entry = ContextBuilder::serialize_entry(&Message::query("hello"));
        assert!(entry.starts_with("{\"role\":\"query\",\"text\":\"hello\""));
        assert!(entry.ends_with(ENTRY_SEPARATOR));
    }

    #[test]
    fn test_serialize_entry_is_valid_json() {
        let message = Message::response("she said \"hi\"\nthen left é");
        let entry = ContextBuilder::serialize_entry(&message);
        let parsed: serde_json::Value =
            serde_json::from_str(entry.trim_end_matches(ENTRY_SEPARATOR)).unwrap();
        assert_eq!(parsed["text"], "she said \"hi\"\nthen left é");
        assert_eq!(parsed["role"], "response");
    }

    #[test]
    fn test_rank_descending_ties_oldest_first() {
        let scores = [0.2, 0.9, 0.2, 0.5];
        assert_eq!(ContextBuilder::rank(&scores), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_select_greedy_stops_at_first_overflow() {
        let entries = vec!["aaaa".to_string(), "bbbbbb".to_string(), "c".to_string()];
        // "c" would fit after "aaaa" but the walk stops at "bbbbbb"
        assert_eq!(ContextBuilder::select_greedy(entries, 6), "aaaa");
    }

    #[test]
    fn test_select_greedy_exact_fit() {
        let entries = vec!["abc".to_string(), "de".to_string()];
        assert_eq!(ContextBuilder::select_greedy(entries, 5), "abcde");
    }

    #[test]
    fn test_select_greedy_budget_smaller_than_first() {
        let entries = vec!["abcdef".to_string()];
        assert_eq!(ContextBuilder::select_greedy(entries, 3), "");
    }

    #[tokio::test]
    async fn test_assemble_empty_history() {
        let scorer = RelevanceScorer::lexical();
        assert_eq!(ContextBuilder::assemble(&scorer, &[], "anything", 1024).await, "");
    }

    #[tokio::test]
    async fn test_assemble_ranks_by_relevance() {
        let scorer = RelevanceScorer::lexical();
        let messages = vec![Message::response("goodbye now"), Message::query("hello there")];

        let context = ContextBuilder::assemble(&scorer, &messages, "hello world", 1024).await;
        let first_line = context.lines().next().unwrap();

        assert!(first_line.contains("hello there"));
        assert_eq!(context.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_assemble_respects_budget() {
        let scorer = RelevanceScorer::lexical();
        let messages: Vec<Message> = (0..10)
            .map(|i| Message::query(format!("message number {}", i)))
            .collect();

        for budget in [0, 10, 60, 61, 150, 400, 10_000] {
            let context = ContextBuilder::assemble(&scorer, &messages, "message", budget).await;
            assert!(context.len() <= budget, "budget {} got {}", budget, context.len());
        }
    }
}
