//! # RAG Chatbot
//!
//! Retrieval-augmented question answering over a document collection.
//!
//! A question is embedded, the nearest chunks are fetched from a Qdrant
//! collection, and an answer is produced either by a hosted generation model
//! or, when none is configured, by keyword-overlap sentence extraction.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rag_chatbot::{RagConfig, RagServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RagConfig::load()?;
//!     let server = RagServer::new(config).await?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{QueryPipeline, QueryStage};
pub use providers::Providers;
pub use server::{state::AppState, RagServer};
pub use types::*;
