use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::MemoryConfig;
use crate::services::providers::EmbeddingProvider;
use crate::utils::similarity::cosine_similarity;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

/// Token-overlap relevance. Pure local computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl LexicalScorer {
    /// Unique lowercase tokens, split on runs of non-word characters
    pub fn tokenize(text: &str) -> HashSet<String> {
        NON_WORD
            .split(text)
            .filter(|token| !token.is_empty())
            .map(|token| token.to_lowercase())
            .collect()
    }

    /// `|A ∩ B| / sqrt(|A| * |B|)`, 0 when either side has no tokens
    pub fn score(&self, a: &str, b: &str) -> f32 {
        let tokens_a = Self::tokenize(a);
        let tokens_b = Self::tokenize(b);

        if tokens_a.is_empty() || tokens_b.is_empty() {
            return 0.0;
        }

        let shared = tokens_a.intersection(&tokens_b).count() as f32;
        let denominator = ((tokens_a.len() * tokens_b.len()) as f32).sqrt();

        shared / denominator
    }
}

/// Cosine similarity over vectors from an external embedding provider
#[derive(Clone)]
pub struct EmbeddingScorer {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
    concurrency: usize,
    /// Shared with the request path so scoring counts toward the same embedding limit
    limiter: Option<Arc<Semaphore>>,
}

impl EmbeddingScorer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            provider,
            timeout,
            concurrency: concurrency.max(1),
            limiter: None,
        }
    }

    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    async fn embed_limited(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let _permit = match &self.limiter {
            Some(limiter) => Some(limiter.clone().acquire_owned().await?),
            None => None,
        };
        self.provider.embed(text).await
    }

    /// Embedding for `text`, or None after logging the failure.
    /// Waiting for a limiter permit counts toward the timeout.
    async fn embed_or_none(&self, text: &str) -> Option<Vec<f32>> {
        match tokio::time::timeout(self.timeout, self.embed_limited(text)).await {
            Ok(Ok(vector)) => Some(vector),
            Ok(Err(e)) => {
                warn!("Scoring embedding failed ({} chars): {:#}", text.len(), e);
                None
            }
            Err(_) => {
                warn!("Scoring embedding timed out after {:?}", self.timeout);
                None
            }
        }
    }

    fn cosine(u: &[f32], v: &[f32]) -> f32 {
        match cosine_similarity(u, v) {
            Ok(similarity) => similarity,
            Err(e) => {
                warn!("Cosine similarity unavailable: {}", e);
                0.0
            }
        }
    }

    pub async fn score(&self, a: &str, b: &str) -> f32 {
        let (u, v) = tokio::join!(self.embed_or_none(a), self.embed_or_none(b));
        match (u, v) {
            (Some(u), Some(v)) => Self::cosine(&u, &v),
            _ => 0.0,
        }
    }

    /// Reference is embedded once; texts are embedded concurrently, order preserved
    pub async fn score_all(&self, reference: &str, texts: &[&str]) -> Vec<f32> {
        let Some(reference_vector) = self.embed_or_none(reference).await else {
            return vec![0.0; texts.len()];
        };

        // Owned inputs keep the buffered futures Send for the axum handlers
        let pending: Vec<_> = texts
            .iter()
            .map(|text| {
                let text = text.to_string();
                async move { self.embed_or_none(&text).await }
            })
            .collect();

        stream::iter(pending)
            .buffered(self.concurrency)
            .map(|vector| match vector {
                Some(vector) => Self::cosine(&reference_vector, &vector),
                None => 0.0,
            })
            .collect()
            .await
    }
}

/// Relevance strategy, fixed for the lifetime of a store
#[derive(Clone)]
pub enum RelevanceScorer {
    Embedding(EmbeddingScorer),
    Lexical(LexicalScorer),
}

impl RelevanceScorer {
    /// Embedding strategy when a provider is configured, lexical otherwise
    pub fn from_provider(
        provider: Option<Arc<dyn EmbeddingProvider>>,
        config: &MemoryConfig,
    ) -> Self {
        match provider {
            Some(provider) => Self::Embedding(EmbeddingScorer::new(
                provider,
                Duration::from_millis(config.embedding_timeout_ms.max(1)),
                config.embedding_concurrency,
            )),
            None => Self::Lexical(LexicalScorer),
        }
    }

    pub fn lexical() -> Self {
        Self::Lexical(LexicalScorer)
    }

    /// Route embedding calls through a shared semaphore; no-op for lexical
    pub fn with_limiter(self, limiter: Arc<Semaphore>) -> Self {
        match self {
            Self::Embedding(scorer) => Self::Embedding(scorer.with_limiter(limiter)),
            lexical => lexical,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::Embedding(_) => "embedding",
            Self::Lexical(_) => "lexical",
        }
    }

    pub async fn score(&self, a: &str, b: &str) -> f32 {
        match self {
            Self::Embedding(scorer) => scorer.score(a, b).await,
            Self::Lexical(scorer) => scorer.score(a, b),
        }
    }

    /// Score every text against one reference
    pub async fn score_all(&self, reference: &str, texts: &[&str]) -> Vec<f32> {
        debug!(
            "Scoring {} messages with {} strategy",
            texts.len(),
            self.strategy_name()
        );

        match self {
            Self::Embedding(scorer) => scorer.score_all(reference, texts).await,
            Self::Lexical(scorer) => texts.iter().map(|text| scorer.score(reference, text)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockEmbeddingProvider;

    fn keyword_provider() -> MockEmbeddingProvider {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().returning(|text| {
            let text = text.to_lowercase();
            Ok(vec![
                if text.contains("rust") { 1.0 } else { 0.0 },
                if text.contains("token") { 1.0 } else { 0.0 },
                0.1,
            ])
        });
        provider
    }

    fn embedding_scorer(provider: MockEmbeddingProvider) -> RelevanceScorer {
        RelevanceScorer::from_provider(Some(Arc::new(provider)), &MemoryConfig::default())
    }

    /// Provider that never answers within the scorer timeout
    struct StalledProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for StalledProvider {
        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![1.0])
        }
    }

    #[test]
    fn test_tokenize_lowercases_and_dedups() {
        let tokens = LexicalScorer::tokenize("Hello, hello WORLD!! foo_bar");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.contains("hello"));
        assert!(tokens.contains("world"));
        assert!(tokens.contains("foo_bar"));
    }

    #[test]
    fn test_lexical_shared_token() {
        let scorer = LexicalScorer;
        // {hello, world} vs {hello, there}: 1 / sqrt(2 * 2)
        let score = scorer.score("hello world", "hello there");
        assert!((score - 0.5).abs() < 1e-6);
        assert_eq!(scorer.score("hello world", "goodbye now"), 0.0);
    }

    #[test]
    fn test_lexical_identical_is_one() {
        let scorer = LexicalScorer;
        let score = scorer.score("The quick fox", "the QUICK fox.");
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lexical_empty_is_zero() {
        let scorer = LexicalScorer;
        assert_eq!(scorer.score("", "hello"), 0.0);
        assert_eq!(scorer.score("hello", "   ...   "), 0.0);
        assert_eq!(scorer.score("", ""), 0.0);
    }

    #[test]
    fn test_lexical_range() {
        let scorer = LexicalScorer;
        let samples = [
            "alpha beta gamma",
            "beta",
            "gamma gamma delta",
            "alpha, beta; gamma! delta epsilon",
            "unrelated words entirely",
        ];
        for a in samples {
            for b in samples {
                let score = scorer.score(a, b);
                assert!((0.0..=1.0 + 1e-6).contains(&score), "{} vs {} = {}", a, b, score);
            }
        }
    }

    #[tokio::test]
    async fn test_embedding_score_uses_cosine() {
        let scorer = embedding_scorer(keyword_provider());
        let related = scorer.score("rust ownership", "learning rust").await;
        let unrelated = scorer.score("rust ownership", "token economy").await;
        assert!(related > 0.9);
        assert!(unrelated < related);
        assert!((-1.0..=1.0).contains(&unrelated));
    }

    #[tokio::test]
    async fn test_embedding_failure_scores_zero() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_embed()
            .returning(|_| Err(anyhow::anyhow!("provider unavailable")));
        let scorer = embedding_scorer(provider);

        assert_eq!(scorer.score("a", "b").await, 0.0);
        assert_eq!(scorer.score_all("a", &["b", "c"]).await, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_embedding_mismatched_dimensions_score_zero() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().returning(|text| {
            if text == "short" {
                Ok(vec![1.0])
            } else {
                Ok(vec![1.0, 0.0])
            }
        });
        let scorer = embedding_scorer(provider);
        assert_eq!(scorer.score("short", "long text").await, 0.0);
    }

    #[tokio::test]
    async fn test_embedding_zero_magnitude_scores_zero() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().returning(|_| Ok(vec![0.0, 0.0]));
        let scorer = embedding_scorer(provider);
        assert_eq!(scorer.score("a", "b").await, 0.0);
    }

    #[tokio::test]
    async fn test_score_all_embeds_reference_once() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_embed()
            .withf(|text| text == "reference")
            .times(1)
            .returning(|_| Ok(vec![1.0, 0.0]));
        provider
            .expect_embed()
            .withf(|text| text != "reference")
            .returning(|text| Ok(if text == "same" { vec![2.0, 0.0] } else { vec![0.0, 1.0] }));
        let scorer = embedding_scorer(provider);

        let scores = scorer.score_all("reference", &["other", "same", "other"]).await;
        assert_eq!(scores.len(), 3);
        assert!(scores[0].abs() < 1e-6);
        assert!((scores[1] - 1.0).abs() < 1e-6);
        assert!(scores[2].abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_embedding_timeout_scores_zero() {
        let config = MemoryConfig {
            embedding_timeout_ms: 10,
            ..MemoryConfig::default()
        };
        let scorer = RelevanceScorer::from_provider(Some(Arc::new(StalledProvider)), &config);
        assert_eq!(scorer.score("a", "b").await, 0.0);
        assert_eq!(scorer.score_all("a", &["b"]).await, vec![0.0]);
    }

    #[tokio::test]
    async fn test_embedding_scoring_runs_in_spawned_task() {
        let scorer = embedding_scorer(keyword_provider());
        let handle = tokio::spawn(async move {
            let texts = vec!["rust book".to_string(), "token sale".to_string()];
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            scorer.score_all("rust", &refs).await
        });

        let scores = handle.await.unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
    }

    #[tokio::test]
    async fn test_scoring_waits_for_shared_limiter() {
        let limiter = Arc::new(Semaphore::new(1));
        let config = MemoryConfig {
            embedding_timeout_ms: 20,
            ..MemoryConfig::default()
        };
        let scorer = RelevanceScorer::from_provider(Some(Arc::new(keyword_provider())), &config)
            .with_limiter(limiter.clone());

        let held = limiter.clone().acquire_owned().await.unwrap();
        assert_eq!(scorer.score("rust ownership", "learning rust").await, 0.0);

        drop(held);
        assert!(scorer.score("rust ownership", "learning rust").await > 0.9);
        assert_eq!(limiter.available_permits(), 1);
    }

    #[test]
    fn test_lexical_ignores_limiter() {
        let scorer = RelevanceScorer::lexical().with_limiter(Arc::new(Semaphore::new(1)));
        assert_eq!(scorer.strategy_name(), "lexical");
    }

    #[test]
    fn test_strategy_selection() {
        let config = MemoryConfig::default();
        assert_eq!(RelevanceScorer::from_provider(None, &config).strategy_name(), "lexical");
        assert_eq!(
            embedding_scorer(MockEmbeddingProvider::new()).strategy_name(),
            "embedding"
        );
    }
}
