use crate::models::chat::*;
use crate::services::RagService;
use crate::utils::error::ApiError;
use axum::{extract::Extension, Json};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

pub async fn chat_handler(
    Extension(rag_service): Extension<Arc<RagService>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let question = required_text(request.question.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Question is required".to_string()))?;

    let request_id = Uuid::new_v4();
    let start_time = Instant::now();
    info!("Chat request {}: question_len={}", request_id, question.len());

    let result = rag_service.answer(question).await?;

    info!(
        "Chat request {} answered: sources={}, confidence={:.3}, elapsed_ms={}",
        request_id,
        result.sources.len(),
        result.confidence,
        start_time.elapsed().as_millis()
    );

    Ok(Json(ChatResponse {
        sources: result.sources.iter().map(SourceInfo::from).collect(),
        confidence: result.confidence,
        answer: result.answer,
    }))
}

/// Answer-only variant used by the embedded chat widget
pub async fn virtron_chat_handler(
    Extension(rag_service): Extension<Arc<RagService>>,
    Json(request): Json<VirtronChatRequest>,
) -> Result<Json<VirtronChatResponse>, ApiError> {
    let query = required_text(request.query.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Query is required".to_string()))?;

    let result = rag_service.answer(query).await?;

    Ok(Json(VirtronChatResponse {
        response: result.answer,
    }))
}
