//! Core types for the RAG chatbot

pub mod query;
pub mod response;

pub use query::{Query, QueryRequest};
pub use response::{Answer, HealthResponse, QueryResponse, RetrievedChunk, RootResponse, SourceRef};
