//! Question embedding and nearest-neighbour search

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, Providers, ScoredPoint, VectorStoreProvider};
use crate::types::RetrievedChunk;

/// Source label for hits whose payload has none
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Embeds questions and searches the configured collection
#[derive(Clone)]
pub struct Retriever {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStoreProvider>>,
}

impl Retriever {
    /// Create a retriever from the provider bundle
    pub fn new(providers: &Providers) -> Self {
        Self {
            embedder: providers.embedder.clone(),
            store: providers.vector_store.clone(),
        }
    }

    /// Embedding vector for `question`
    pub async fn embed_question(&self, question: &str) -> Result<Vec<f32>> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| Error::dependency("embedding", "No embedding provider configured"))?;

        let vector = embedder.embed(question).await?;
        if vector.is_empty() {
            return Err(Error::dependency(embedder.name(), "Embedding provider returned an empty vector"));
        }
        Ok(vector)
    }

    /// Top `top_k` chunks for `vector`, in the store's similarity order
    pub async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| Error::dependency("vector_store", "No vector store configured"))?;

        let points = store.search(vector, top_k).await?;
        tracing::debug!("{} returned {} hits", store.name(), points.len());
        Ok(points.into_iter().map(to_chunk).collect())
    }

    /// Embed `question` and return its nearest chunks
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let vector = self.embed_question(question).await?;
        self.search(&vector, top_k).await
    }
}

/// Map a hit to a chunk, defaulting missing payload fields
pub fn to_chunk(point: ScoredPoint) -> RetrievedChunk {
    RetrievedChunk {
        text: point.payload_str("text").unwrap_or_default().to_string(),
        source: point.payload_str("source").unwrap_or(UNKNOWN_SOURCE).to_string(),
        score: point.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(payload: serde_json::Value, score: f32) -> ScoredPoint {
        ScoredPoint {
            score: Some(score),
            payload: payload.as_object().cloned(),
        }
    }

    #[test]
    fn test_payload_mapping() {
        let chunk = to_chunk(point(json!({"text": "Actuators move joints.", "source": "Ch. 2"}), 0.7));
        assert_eq!(chunk, RetrievedChunk::new("Actuators move joints.", "Ch. 2", Some(0.7)));
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let chunk = to_chunk(point(json!({"chapter": "1"}), 0.2));
        assert_eq!(chunk.text, "");
        assert_eq!(chunk.source, UNKNOWN_SOURCE);

        let chunk = to_chunk(ScoredPoint::default());
        assert_eq!(chunk.source, UNKNOWN_SOURCE);
        assert_eq!(chunk.score, None);
    }

    #[test]
    fn test_non_string_fields_get_defaults() {
        let chunk = to_chunk(point(json!({"text": 42, "source": null}), 0.1));
        assert_eq!(chunk.text, "");
        assert_eq!(chunk.source, UNKNOWN_SOURCE);
    }

    #[tokio::test]
    async fn test_unconfigured_providers_are_dependency_errors() {
        let retriever = Retriever::new(&Providers::default());
        let err = retriever.retrieve("What is a humanoid?", 3).await.unwrap_err();
        assert!(matches!(err, Error::DependencyUnavailable { .. }));

        let err = retriever.search(&[0.1, 0.2], 3).await.unwrap_err();
        assert!(matches!(err, Error::DependencyUnavailable { .. }));
    }
}
