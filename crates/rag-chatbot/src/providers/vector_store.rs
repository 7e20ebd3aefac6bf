//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Result;

/// Search hit from the vector store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoredPoint {
    /// Similarity score, higher is more similar
    #[serde(default)]
    pub score: Option<f32>,
    /// Stored payload (absent when the point has none)
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
}

impl ScoredPoint {
    /// Read a string field from the payload
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.as_ref()?.get(key)?.as_str()
    }
}

/// A point to write into the store
#[derive(Debug, Clone, Serialize)]
pub struct VectorPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// Existence and size of the configured collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStatus {
    pub exists: bool,
    pub points_count: Option<u64>,
}

impl CollectionStatus {
    /// A collection that does not exist
    pub fn missing() -> Self {
        Self {
            exists: false,
            points_count: None,
        }
    }

    /// Whether the collection exists and reports zero points
    pub fn is_empty(&self) -> bool {
        self.exists && self.points_count == Some(0)
    }
}

/// Trait for vector storage and similarity search over one fixed collection
///
/// Implementations:
/// - `QdrantQueryApi`: Qdrant 1.10+ universal query endpoint
/// - `QdrantSearchApi`: Qdrant search endpoint for older servers
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Nearest neighbours of `vector`, most similar first
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>>;

    /// Whether the collection exists and how many points it holds
    async fn collection_status(&self) -> Result<CollectionStatus>;

    /// Create the collection with cosine distance if it is missing
    async fn ensure_collection(&self, dimensions: usize) -> Result<()>;

    /// Drop the collection and everything in it
    async fn delete_collection(&self) -> Result<()>;

    /// Insert or replace points
    async fn upsert(&self, points: &[VectorPoint]) -> Result<()>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Name of the collection searched
    fn collection(&self) -> &str;
}
