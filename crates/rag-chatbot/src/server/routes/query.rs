//! Query endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/query - Answer a question from the collection
pub async fn query_rag(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = payload.map_err(rejection_error)?;
    tracing::info!("Query: \"{}\"", request.question);

    let response = state.pipeline().respond(request).await?;
    Ok(Json(response))
}

/// POST /api/chat - Same as `/api/query`; accepts the `{"query": ...}` body older clients send
pub async fn chat(
    state: State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    query_rag(state, payload).await
}

/// Oversized bodies keep their 413; every other rejection is a bad request
fn rejection_error(rejection: JsonRejection) -> Error {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(rejection.body_text())
    } else {
        Error::invalid_argument(rejection.body_text())
    }
}
