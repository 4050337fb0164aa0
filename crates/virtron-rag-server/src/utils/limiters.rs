use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::LimitsConfig;

#[derive(Clone)]
pub struct Limiters {
    pub embedding: Arc<Semaphore>,
    pub llm_generate: Arc<Semaphore>,
    pub acquire_timeout: Duration,
}

impl Limiters {
    pub fn new(cfg: &LimitsConfig) -> Self {
        Self {
            embedding: Arc::new(Semaphore::new(cfg.embedding_concurrency.max(1))),
            llm_generate: Arc::new(Semaphore::new(cfg.llm_generate_concurrency.max(1))),
            acquire_timeout: Duration::from_millis(cfg.acquire_timeout_ms.max(1)),
        }
    }

    pub async fn acquire_timed(
        sem: Arc<Semaphore>,
        acquire_timeout: Duration,
        op: &'static str,
    ) -> Result<(OwnedSemaphorePermit, Duration)> {
        let start = Instant::now();

        let permit = tokio::time::timeout(acquire_timeout, sem.acquire_owned())
            .await
            .map_err(|_| anyhow::anyhow!("Limiter acquire timeout for op={}", op))??;

        Ok((permit, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(concurrency: usize) -> LimitsConfig {
        LimitsConfig {
            embedding_concurrency: concurrency,
            llm_generate_concurrency: concurrency,
            acquire_timeout_ms: 20,
        }
    }

    #[tokio::test]
    async fn test_acquire_within_capacity() {
        let limiters = Limiters::new(&limits(1));
        let (permit, _) = Limiters::acquire_timed(
            limiters.embedding.clone(),
            limiters.acquire_timeout,
            "embed",
        )
        .await
        .unwrap();
        drop(permit);
        assert_eq!(limiters.embedding.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_acquire_times_out_when_exhausted() {
        let limiters = Limiters::new(&limits(1));
        let _held = limiters.llm_generate.clone().acquire_owned().await.unwrap();

        let result = Limiters::acquire_timed(
            limiters.llm_generate.clone(),
            limiters.acquire_timeout,
            "generate",
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let limiters = Limiters::new(&limits(0));
        assert_eq!(limiters.embedding.available_permits(), 1);
    }
}
