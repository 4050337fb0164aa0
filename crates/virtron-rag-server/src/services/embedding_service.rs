use crate::config::EmbeddingConfig;
use crate::services::providers::EmbeddingProvider;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Inputs shorter than this (after trimming) get a zero vector without a request
const MIN_EMBED_CHARS: usize = 2;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    input: &'a str,
}

#[derive(Clone)]
pub struct EmbeddingService {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl EmbeddingService {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_internal(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().chars().count() < MIN_EMBED_CHARS {
            debug!("Text too short for embedding, returning zero vector");
            return Ok(vec![0.0; self.dimension]);
        }

        debug!("Generating embedding for {} chars", text.len());

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
            input: text, // Send both for compatibility
        };

        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to embedding server")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding API error ({}): {}", status, body);
        }

        let json_value: Value = response
            .json()
            .await
            .context("Failed to parse embedding response as JSON")?;

        let embedding = parse_embedding(&json_value)?;

        if embedding.len() != self.dimension {
            anyhow::bail!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                embedding.len()
            );
        }

        Ok(embedding)
    }
}

fn floats(values: &[Value]) -> Vec<f32> {
    values
        .iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

/// Accepts `{"embedding": [...]}`, `{"embeddings": [[...]]}`,
/// `{"data": [{"embedding": [...]}]}`, `[{"embedding": [...]}]` and bare arrays
pub fn parse_embedding(json_value: &Value) -> Result<Vec<f32>> {
    let embedding = match json_value {
        Value::Object(map) => match (map.get("embedding"), map.get("embeddings"), map.get("data")) {
            (Some(Value::Array(values)), _, _) => floats(values),
            (_, Some(Value::Array(rows)), _) => match rows.first() {
                Some(Value::Array(values)) => floats(values),
                _ => anyhow::bail!("Unrecognized embedding response format: {}", json_value),
            },
            (_, _, Some(Value::Array(data))) => match data.first().and_then(|d| d.get("embedding")) {
                Some(Value::Array(values)) => floats(values),
                _ => anyhow::bail!("Unrecognized embedding response format: {}", json_value),
            },
            _ => anyhow::bail!("Unrecognized embedding response format: {}", json_value),
        },
        Value::Array(arr) => match arr.first() {
            None => anyhow::bail!("Empty array returned from embedding server"),
            Some(first) => match first.get("embedding") {
                Some(Value::Array(values)) => floats(values),
                _ => floats(arr),
            },
        },
        _ => anyhow::bail!("Unrecognized embedding response format: {}", json_value),
    };

    if embedding.is_empty() {
        anyhow::bail!("Generated embedding is empty");
    }

    Ok(embedding)
}

#[async_trait::async_trait]
impl EmbeddingProvider for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_internal(text).await
    }
}
