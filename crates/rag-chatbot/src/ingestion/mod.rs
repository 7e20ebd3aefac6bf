//! Document ingestion into the vector store

mod chunker;
mod ingest;

pub use chunker::TextChunker;
pub use ingest::{
    IngestReport, Ingestor, PendingChunk, SourceDocument, DEFAULT_BATCH_SIZE, SUPPORTED_EXTENSIONS,
};
