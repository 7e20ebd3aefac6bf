//! Provider abstractions for embeddings, generation and vector search
//!
//! The pipeline only sees the three traits below. Concrete adapters for
//! Hugging Face and Qdrant live in their own modules and are assembled once at
//! startup into a [`Providers`] bundle.

pub mod embedding;
pub mod huggingface;
pub mod llm;
pub mod qdrant;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use vector_store::{CollectionStatus, ScoredPoint, VectorPoint, VectorStoreProvider};

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use huggingface::{HuggingFaceClient, HuggingFaceEmbedder, HuggingFaceLlm};

/// Provider handles shared by every request. Never modified after startup.
#[derive(Clone, Default)]
pub struct Providers {
    /// Embedding provider
    pub embedder: Option<Arc<dyn EmbeddingProvider>>,
    /// Vector store (absent when no Qdrant URL is configured)
    pub vector_store: Option<Arc<dyn VectorStoreProvider>>,
    /// Generation provider (absent without an API token and model)
    pub llm: Option<Arc<dyn LlmProvider>>,
}

impl Providers {
    /// Build every provider the configuration allows
    pub async fn from_config(config: &RagConfig) -> Result<Self> {
        let hf_client = Arc::new(HuggingFaceClient::new(&config.huggingface)?);

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HuggingFaceEmbedder::new(
            Arc::clone(&hf_client),
            config.huggingface.embedding_model.clone(),
        ));
        tracing::info!("Embedding model: {}", config.huggingface.embedding_model);
        if config.huggingface.api_token.is_none() {
            tracing::warn!("HF_API_TOKEN is not set; embedding requests will be anonymous");
        }

        let vector_store = match &config.qdrant.url {
            Some(url) => {
                let store = qdrant::connect(url, &config.qdrant).await?;
                tracing::info!(
                    "Vector store: {} (collection '{}')",
                    store.name(),
                    store.collection()
                );
                Some(store)
            }
            None => {
                tracing::warn!("QDRANT_URL is not set; queries will fail until it is configured");
                None
            }
        };

        let llm: Option<Arc<dyn LlmProvider>> = match (
            &config.huggingface.api_token,
            &config.huggingface.generation_model,
        ) {
            (Some(_), Some(model)) => {
                tracing::info!("Generation model: {}", model);
                Some(Arc::new(HuggingFaceLlm::new(hf_client, model.clone(), &config.huggingface)))
            }
            _ => {
                tracing::info!("No generation model configured");
                None
            }
        };

        Ok(Self {
            embedder: Some(embedder),
            vector_store,
            llm,
        })
    }

    /// Replace the embedder
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Replace the vector store
    pub fn with_vector_store(mut self, store: Arc<dyn VectorStoreProvider>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Replace the generation provider
    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }
}
