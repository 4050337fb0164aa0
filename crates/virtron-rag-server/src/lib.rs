pub mod config;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, TraceLayer},
};

use config::ServerConfig;
use services::RagService;

pub fn build_router(rag_service: Arc<RagService>, server: &ServerConfig) -> Router {
    let memory = rag_service.memory().clone();

    let api_routes = Router::new()
        .route("/api/chat", post(handlers::chat::chat_handler))
        .route("/api/virtron-chat", post(handlers::chat::virtron_chat_handler))
        .route(
            "/api/generate-embedding",
            post(handlers::embedding::generate_embedding_handler),
        )
        .route(
            "/api/memory",
            get(handlers::memory::memory_stats_handler).delete(handlers::memory::clear_memory_handler),
        );

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .merge(api_routes);

    // Frontend assets; unknown paths get index.html
    let static_dir = Path::new(&server.static_dir);
    if static_dir.exists() {
        let index = static_dir.join("index.html");
        app = app.fallback_service(ServeDir::new(static_dir).not_found_service(ServeFile::new(index)));
    }

    app.layer(Extension(rag_service))
        .layer(Extension(memory))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CatchPanicLayer::new())
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
}
