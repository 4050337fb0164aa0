use crate::models::chat::{required_text, EmbeddingRequest, EmbeddingResponse};
use crate::services::RagService;
use crate::utils::error::ApiError;
use axum::{extract::Extension, Json};
use std::sync::Arc;
use tracing::debug;

pub async fn generate_embedding_handler(
    Extension(rag_service): Extension<Arc<RagService>>,
    Json(request): Json<EmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    let text = required_text(request.text.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Text is required".to_string()))?;

    let embedding = rag_service.embed(text).await?;
    debug!("Embedding generated: dim={}", embedding.len());

    Ok(Json(EmbeddingResponse { embedding }))
}
