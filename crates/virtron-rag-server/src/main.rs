use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use virtron_rag_server::{
    build_router,
    config::Settings,
    logging,
    services::{
        conversation::{ConversationStore, RelevanceScorer, StoreLimits},
        EmbeddingProvider, EmbeddingService, InMemoryVectorIndex, LlmService, RagService,
    },
    utils::limiters::Limiters,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so logging can honor it
    let settings = Settings::load()?;
    logging::init_tracing(&settings.logging)?;

    info!("🚀 Starting Virtron RAG server...");
    info!("✅ Configuration loaded (file: {})", settings.config_path().display());

    // Initialize services
    let embedding: Option<Arc<dyn EmbeddingProvider>> = if settings.embedding.enabled {
        let service = EmbeddingService::new(&settings.embedding);
        info!(
            "✅ Embedding service ready: model={}, dim={}",
            settings.embedding.model,
            service.dimension()
        );
        Some(Arc::new(service))
    } else {
        warn!("Embeddings disabled: lexical memory scoring, no document retrieval");
        None
    };

    let llm_service = Arc::new(LlmService::new(
        settings.llm.clone(),
        settings.prompts.system_prompt.clone(),
    ));
    info!("✅ LLM service ready: model={}", settings.llm.model);

    // Memory scoring shares the embedding limiter with retrieval
    let limiters = Limiters::new(&settings.limits);
    let scorer = RelevanceScorer::from_provider(embedding.clone(), &settings.memory)
        .with_limiter(limiters.embedding.clone());
    let memory = Arc::new(ConversationStore::new(
        StoreLimits::from(&settings.memory),
        scorer,
    ));
    info!("✅ Conversation memory ready: strategy={}", memory.strategy_name());

    let rag_service = Arc::new(RagService::new(
        embedding,
        Arc::new(InMemoryVectorIndex::new()),
        llm_service,
        memory,
        limiters,
        settings.rag.clone(),
        settings.memory.max_context_bytes,
    ));

    // Index in background so the listener comes up immediately
    let seeder = rag_service.clone();
    let documents = settings.documents.seed.clone();
    tokio::spawn(async move {
        seeder.seed_documents(&documents).await;
    });

    let app = build_router(rag_service, &settings.server);

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
    tokio::time::sleep(Duration::from_millis(100)).await;
}
