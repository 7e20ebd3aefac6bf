//! API routes for the RAG server

pub mod query;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;
use crate::types::HealthResponse;

/// Build all API routes
pub fn api_routes(max_body_size: usize) -> Router<AppState> {
    Router::new()
        // Query
        .route("/query", post(query::query_rag))
        .route("/chat", post(query::chat))
        .layer(DefaultBodyLimit::max(max_body_size))
        // Liveness for the front end
        .route("/health", get(health))
        // Info
        .route("/info", get(info))
}

/// GET /api/health - Fixed payload once the server is up, independent of provider health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    let providers = state.providers();

    Json(serde_json::json!({
        "name": "rag-chatbot",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Retrieval-augmented question answering over a Qdrant collection",
        "endpoints": {
            "GET /": "Liveness",
            "GET /api/health": "Service health",
            "POST /api/query": "Answer a question ({question, top_k?})",
            "POST /api/chat": "Same as /api/query, accepts {query}",
            "GET /api/info": "This document"
        },
        "collection": config.qdrant.collection,
        "corpus": config.answer.corpus_label,
        "answer_strategy": state.pipeline().strategy_name(),
        "embedding_model": providers.embedder.as_ref().map(|e| e.model().to_string()),
        "generation_model": providers.llm.as_ref().map(|l| l.model().to_string()),
        "vector_store": providers.vector_store.as_ref().map(|v| v.name().to_string()),
        "max_top_k": config.retrieval.max_top_k
    }))
}
