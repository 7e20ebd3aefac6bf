//! Application state for the RAG server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::pipeline::QueryPipeline;
use crate::providers::Providers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Provider handles, fixed after startup
    providers: Providers,
    /// Query orchestration
    pipeline: QueryPipeline,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Build providers from the configuration and create the state
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG application state...");
        let providers = Providers::from_config(&config).await?;
        Self::with_providers(config, providers)
    }

    /// Create the state around existing providers
    pub fn with_providers(config: RagConfig, providers: Providers) -> Result<Self> {
        let pipeline = QueryPipeline::new(&providers, &config)?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                providers,
                pipeline,
                ready: RwLock::new(false),
            }),
        })
    }

    /// Check that the collection exists and holds vectors. Problems are logged, never returned.
    pub async fn verify_collection(&self) {
        let Some(store) = &self.inner.providers.vector_store else {
            tracing::warn!("No vector store configured; skipping collection check");
            return;
        };
        let collection = store.collection();

        match store.collection_status().await {
            Ok(status) if !status.exists => {
                tracing::warn!(
                    "Collection '{}' does not exist. Run the ingestion tool first.",
                    collection
                );
            }
            Ok(status) if status.is_empty() => {
                tracing::warn!(
                    "Collection '{}' exists but has 0 vectors. Re-run the ingestion tool.",
                    collection
                );
            }
            Ok(status) => match status.points_count {
                Some(count) => tracing::info!("Collection '{}' has {} vectors", collection, count),
                None => tracing::info!("Connected to collection '{}'", collection),
            },
            Err(e) => {
                tracing::error!("Could not check collection '{}': {}", collection, e);
            }
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the provider bundle
    pub fn providers(&self) -> &Providers {
        &self.inner.providers
    }

    /// Get the query pipeline
    pub fn pipeline(&self) -> &QueryPipeline {
        &self.inner.pipeline
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
