use crate::services::conversation::{ConversationStore, MemoryStats};
use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;

pub async fn memory_stats_handler(
    Extension(store): Extension<Arc<ConversationStore>>,
) -> Json<MemoryStats> {
    Json(store.stats().await)
}

/// Forget the shared dialogue history
pub async fn clear_memory_handler(
    Extension(store): Extension<Arc<ConversationStore>>,
) -> StatusCode {
    store.clear().await;
    StatusCode::NO_CONTENT
}
