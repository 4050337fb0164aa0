use tracing::{debug, info};

use super::scorer::RelevanceScorer;
use super::types::Message;

/// Indices of the `excess` lowest scores. Ties evict the oldest message first.
pub fn eviction_set(scores: &[f32], excess: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable sort keeps insertion order among equal scores
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    order.truncate(excess);
    order.sort_unstable();
    order
}

/// Indices into `texts` to evict so that at most `max_message_count` remain.
/// Only scores; nothing is mutated.
pub async fn plan_evictions(
    scorer: &RelevanceScorer,
    texts: &[&str],
    reference_context: &str,
    max_message_count: usize,
) -> Vec<usize> {
    if texts.len() <= max_message_count {
        return Vec::new();
    }

    let excess = texts.len() - max_message_count;
    let scores = scorer.score_all(reference_context, texts).await;

    let evict = eviction_set(&scores, excess);
    debug!("Evicting messages at {:?} (scores {:?})", evict, scores);
    evict
}

/// Remove the sorted `evict` indices in one order-preserving pass
pub fn remove_indices(messages: &mut Vec<Message>, evict: &[usize]) {
    if evict.is_empty() {
        return;
    }

    let mut evict_iter = evict.iter().peekable();
    let mut index = 0usize;
    messages.retain(|_| {
        let drop_it = evict_iter.peek().is_some_and(|&&next| next == index);
        if drop_it {
            evict_iter.next();
        }
        index += 1;
        !drop_it
    });

    info!(
        "Pruned {} messages from conversation memory ({} remain)",
        evict.len(),
        messages.len()
    );
}

/// Drop the lowest scoring messages until at most `max_message_count` remain.
///
/// Scores and the eviction set are computed before `messages` is touched, so a
/// cancelled call leaves the history unchanged. Returns the number evicted.
pub async fn prune(
    scorer: &RelevanceScorer,
    messages: &mut Vec<Message>,
    reference_context: &str,
    max_message_count: usize,
) -> usize {
    let texts: Vec<&str> = messages.iter().map(|m| m.text()).collect();
    let evict = plan_evictions(scorer, &texts, reference_context, max_message_count).await;

    remove_indices(messages, &evict);
    evict.len()
}
