//! Fill a collection from text files

use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;
use walkdir::WalkDir;

use super::chunker::TextChunker;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, Providers, VectorPoint, VectorStoreProvider};

/// File extensions picked up when walking a directory
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

/// Default number of chunks embedded and upserted per request
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A text document to ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Label stored as the `source` payload field
    pub source: String,
    /// Full document text
    pub text: String,
}

impl SourceDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A chunk waiting to be embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChunk {
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
}

/// Summary of an ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub dimensions: Option<usize>,
}

/// Chunks documents, embeds the chunks and writes them to the vector store
pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    chunker: TextChunker,
    batch_size: usize,
}

impl Ingestor {
    /// Create an ingestor. Both an embedder and a vector store are required.
    pub fn new(providers: &Providers) -> Result<Self> {
        let embedder = providers
            .embedder
            .clone()
            .ok_or_else(|| Error::Config("ingestion needs an embedding provider".to_string()))?;
        let store = providers
            .vector_store
            .clone()
            .ok_or_else(|| Error::Config("ingestion needs QDRANT_URL".to_string()))?;

        Ok(Self {
            embedder,
            store,
            chunker: TextChunker::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Use a different chunker
    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Set the embed/upsert batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Read a file, or every supported file under a directory, sorted by path
    pub fn load_documents(path: impl AsRef<Path>) -> Result<Vec<SourceDocument>> {
        let root = path.as_ref();
        if root.is_file() {
            return Ok(vec![read_document(root, root)?]);
        }
        if !root.is_dir() {
            return Err(Error::Config(format!("{} does not exist", root.display())));
        }

        let mut documents = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Internal(format!("walk failed: {}", e)))?;
            if !entry.file_type().is_file() || !is_supported(entry.path()) {
                continue;
            }
            documents.push(read_document(root, entry.path())?);
        }

        tracing::info!("Found {} documents under {}", documents.len(), root.display());
        Ok(documents)
    }

    /// Chunk every document, numbering chunks per document
    pub fn prepare(&self, documents: &[SourceDocument]) -> Vec<PendingChunk> {
        documents
            .iter()
            .flat_map(|doc| {
                self.chunker
                    .chunk(&doc.text)
                    .into_iter()
                    .enumerate()
                    .map(move |(chunk_index, text)| PendingChunk {
                        text,
                        source: doc.source.clone(),
                        chunk_index,
                    })
            })
            .collect()
    }

    /// Ingest documents. `fresh` drops the collection first.
    /// `on_batch` receives the number of chunks written so far and the total.
    pub async fn ingest<F>(
        &self,
        documents: &[SourceDocument],
        fresh: bool,
        mut on_batch: F,
    ) -> Result<IngestReport>
    where
        F: FnMut(usize, usize),
    {
        let chunks = self.prepare(documents);
        let mut report = IngestReport {
            documents: documents.len(),
            ..IngestReport::default()
        };
        tracing::info!(
            "Ingesting {} chunks from {} documents into '{}'",
            chunks.len(),
            documents.len(),
            self.store.collection()
        );

        if !self.store.health_check().await? {
            return Err(Error::dependency(
                self.store.name(),
                format!("vector store is unreachable, nothing written to '{}'", self.store.collection()),
            ));
        }

        if fresh {
            tracing::info!("Dropping collection '{}'", self.store.collection());
            self.store.delete_collection().await?;
        }
        if chunks.is_empty() {
            return Ok(report);
        }

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::dependency(
                    self.embedder.name(),
                    format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
                ));
            }

            let dimensions = match report.dimensions {
                Some(d) => d,
                None => {
                    let d = vectors.first().map(Vec::len).unwrap_or_default();
                    if d == 0 {
                        return Err(Error::dependency(self.embedder.name(), "empty embedding"));
                    }
                    self.store.ensure_collection(d).await?;
                    report.dimensions = Some(d);
                    d
                }
            };

            let points = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| {
                    if vector.len() != dimensions {
                        return Err(Error::dependency(
                            self.embedder.name(),
                            format!("embedding has {} dimensions, expected {}", vector.len(), dimensions),
                        ));
                    }
                    Ok(VectorPoint {
                        id: Uuid::new_v4(),
                        vector,
                        payload: json!({
                            "text": chunk.text,
                            "source": chunk.source,
                            "chunk_index": chunk.chunk_index,
                        }),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            self.store.upsert(&points).await?;
            report.chunks += points.len();
            tracing::debug!("Upserted {}/{} chunks", report.chunks, chunks.len());
            on_batch(report.chunks, chunks.len());
        }

        tracing::info!("Ingestion complete: {} chunks", report.chunks);
        Ok(report)
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read `path`, labelling it relative to `root` (or by file name for a single file)
fn read_document(root: &Path, path: &Path) -> Result<SourceDocument> {
    let text = std::fs::read_to_string(path)?;
    let label = path
        .strip_prefix(root)
        .ok()
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| path.file_name().map(Path::new))
        .unwrap_or(path);
    Ok(SourceDocument::new(label.to_string_lossy(), text))
}
