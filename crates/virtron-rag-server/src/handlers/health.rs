use crate::services::RagService;
use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: String,
    documents: usize,
    embeddings_enabled: bool,
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Ready once the reference corpus is indexed (or retrieval is disabled)
pub async fn readiness_check(
    Extension(rag_service): Extension<Arc<RagService>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let documents = rag_service.document_count().await;
    let embeddings_enabled = rag_service.has_embeddings();
    let ready = !embeddings_enabled || documents > 0;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "indexing" }.to_string(),
            documents,
            embeddings_enabled,
        }),
    )
}
