use serde::{Deserialize, Serialize};

use crate::services::providers::SearchHit;

const PREVIEW_CHARS: usize = 150;

// ===== REQUEST MODELS =====

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VirtronChatRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingRequest {
    #[serde(default)]
    pub text: Option<String>,
}

// ===== RESPONSE MODELS =====

#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub id: String,
    pub similarity: f32,
    pub preview: String, // first 150 chars
}

impl From<&SearchHit> for SourceInfo {
    fn from(hit: &SearchHit) -> Self {
        Self {
            id: hit.id.clone(),
            similarity: hit.score,
            preview: hit.text.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub confidence: f32,
    pub sources: Vec<SourceInfo>,
}

#[derive(Debug, Serialize)]
pub struct VirtronChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

/// Trimmed non-empty field value, or None
pub fn required_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
