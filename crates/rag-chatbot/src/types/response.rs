//! Retrieval results, answers and response payloads

use serde::{Deserialize, Serialize};

/// A chunk returned by the vector store, in similarity order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk text (empty when the payload had none)
    pub text: String,
    /// Source label (`"Unknown"` when the payload had none)
    pub source: String,
    /// Similarity score reported by the store
    pub score: Option<f32>,
}

impl RetrievedChunk {
    /// Create a chunk
    pub fn new(text: impl Into<String>, source: impl Into<String>, score: Option<f32>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            score,
        }
    }
}

/// Outcome of one query
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Synthesised answer text
    pub text: String,
    /// Chunks the answer was built from, in retrieval order
    pub sources: Vec<RetrievedChunk>,
    /// The question that was asked
    pub question: String,
}

/// Source entry in a query response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk text, possibly shortened
    pub text: String,
    /// Source label
    pub source: String,
    /// Similarity score
    pub relevance_score: Option<f32>,
}

/// Response from `POST /api/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer
    pub answer: String,
    /// Sources in retrieval order
    pub sources: Vec<SourceRef>,
    /// The question that was asked
    pub question: String,
}

impl QueryResponse {
    /// Build the wire response. `preview_chars` of 0 keeps full source texts.
    pub fn from_answer(answer: Answer, preview_chars: usize) -> Self {
        let sources = answer
            .sources
            .into_iter()
            .map(|chunk| SourceRef {
                text: preview(&chunk.text, preview_chars),
                source: chunk.source,
                relevance_score: chunk.score,
            })
            .collect();

        Self {
            answer: answer.text,
            sources,
            question: answer.question,
        }
    }
}

/// Shorten `text` to `max_chars` characters followed by `...`
fn preview(text: &str, max_chars: usize) -> String {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars).collect();
    short.push_str("...");
    short
}

/// Payload of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}

/// Payload of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl HealthResponse {
    /// The fixed healthy payload
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "RAG Chatbot API".to_string(),
        }
    }
}
