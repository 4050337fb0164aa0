use crate::config::LlmConfig;
use crate::services::providers::LlmProvider;
use crate::utils::error::ApiError;
use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system: &'a str,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

#[derive(Clone)]
pub struct LlmService {
    client: Client,
    config: LlmConfig,
    system_prompt: String,
}

impl LlmService {
    pub fn new(config: LlmConfig, system_prompt: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
            system_prompt,
        }
    }

    /// Generate completion without streaming (wait for full response)
    pub async fn generate_text(&self, prompt: &str) -> Result<String, ApiError> {
        debug!("Starting generation with {} prompt chars", prompt.len());

        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            system: &self.system_prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url.trim_end_matches('/')))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::LlmError(format!("Failed to call LLM API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::LlmError(format!(
                "LLM API error: {} - {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ApiError::LlmError(format!("Failed to parse LLM response: {}", e)))?;

        Ok(generated.response.trim().to_string())
    }
}

#[async_trait::async_trait]
impl LlmProvider for LlmService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_text(prompt)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
