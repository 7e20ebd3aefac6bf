//! RAG chatbot server binary
//!
//! Run with: cargo run -p rag-chatbot --bin rag-chatbot-server

use rag_chatbot::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (also reads .env, so RUST_LOG set there applies below)
    let config = RagConfig::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_chatbot=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Configuration loaded");
    tracing::info!(
        "  - Qdrant: {}",
        config.qdrant.url.as_deref().unwrap_or("(not configured)")
    );
    tracing::info!("  - Collection: {}", config.qdrant.collection);
    tracing::info!("  - Embedding model: {}", config.huggingface.embedding_model);
    tracing::info!(
        "  - Generation model: {}",
        config
            .huggingface
            .generation_model
            .as_deref()
            .unwrap_or("(none, extractive answers)")
    );
    tracing::info!("  - Answer strategy: {:?}", config.answer.strategy);
    tracing::info!("  - CORS origins: {}", config.server.cors_origins.join(", "));

    // Create and start server
    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/api/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/query  - Ask a question");
    println!("  POST /api/chat   - Ask a question ({{\"query\": ...}})");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
