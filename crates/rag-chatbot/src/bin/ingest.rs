//! Ingestion CLI: chunk text files, embed them and store them in Qdrant
//!
//! Run with: cargo run -p rag-chatbot --features cli --bin rag-ingest -- data/

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rag_chatbot::{
    config::RagConfig,
    ingestion::{Ingestor, TextChunker, DEFAULT_BATCH_SIZE},
    providers::Providers,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rag-ingest", version)]
#[command(about = "Load .txt and .md files into the RAG vector collection")]
struct Args {
    /// File or directory to ingest
    path: PathBuf,

    /// Drop the collection before ingesting
    #[arg(long)]
    fresh: bool,

    /// Target collection (overrides COLLECTION_NAME)
    #[arg(long)]
    collection: Option<String>,

    /// Chunk size in characters
    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[arg(long, default_value_t = 200)]
    overlap: usize,

    /// Chunks embedded and upserted per request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = RagConfig::load()?;
    if let Some(collection) = args.collection {
        config.qdrant.collection = collection;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_chatbot=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        "{} {} into collection {}",
        style("Ingesting").bold().cyan(),
        args.path.display(),
        style(&config.qdrant.collection).bold()
    );

    let documents = Ingestor::load_documents(&args.path)?;
    if documents.is_empty() {
        println!("{} no .txt or .md files found", style("Nothing to do:").yellow());
        return Ok(());
    }

    let providers = Providers::from_config(&config).await?;
    let ingestor = Ingestor::new(&providers)?
        .with_chunker(TextChunker::new(args.chunk_size, args.overlap))
        .with_batch_size(args.batch_size);

    let total = ingestor.prepare(&documents).len();
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks")?
            .progress_chars("=>-"),
    );

    let start = Instant::now();
    let result = ingestor
        .ingest(&documents, args.fresh, |done, _| bar.set_position(done as u64))
        .await;

    match result {
        Ok(report) => {
            bar.finish_and_clear();
            println!(
                "{} {} chunks from {} documents ({} dimensions) in {:.1}s",
                style("Done:").bold().green(),
                report.chunks,
                report.documents,
                report.dimensions.unwrap_or_default(),
                start.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            eprintln!("{} {}", style("Ingestion failed:").bold().red(), e);
            Err(e.into())
        }
    }
}
