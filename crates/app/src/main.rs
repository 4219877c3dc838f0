use chrono::Utc;
use clap::{Parser, ValueEnum};
use doc_ingest_core::{
    collect_input_files, CharacterNgramEmbedder, Embedder, IngestionOptions, IngestionPipeline,
    MiniLmEmbedder, QdrantStore, DEFAULT_COLLECTION, DEFAULT_QDRANT_URL,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EmbedderKind {
    /// all-MiniLM-L6-v2 via local ONNX runtime.
    Minilm,
    /// Hashed character trigrams; offline and deterministic.
    Ngram,
}

#[derive(Parser)]
#[command(
    name = "doc-ingest",
    version,
    about = "Ingest local files into a Qdrant collection"
)]
struct Cli {
    /// File or directory to ingest.
    path: PathBuf,

    /// Qdrant collection name
    #[arg(long, env = "COLLECTION_NAME", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Target words per chunk
    #[arg(long, default_value_t = 400)]
    chunk_size: usize,

    /// Largest trailing paragraph, in words, repeated at the start of the next chunk
    #[arg(long, default_value_t = 50)]
    overlap: usize,

    /// Qdrant base URL
    #[arg(long, env = "QDRANT_URL", default_value = DEFAULT_QDRANT_URL)]
    qdrant_url: String,

    /// Qdrant API key, sent as the `api-key` header
    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true)]
    qdrant_api_key: Option<String>,

    /// Recursively process directories
    #[arg(long, default_value_t = false)]
    recursive: bool,

    /// Embedding backend
    #[arg(long, value_enum, default_value = "minilm")]
    embedder: EmbedderKind,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let files = collect_input_files(&cli.path, cli.recursive)?;

    println!("Found {} file(s) to ingest", files.len());
    println!("Collection: {}", cli.collection);
    println!("Chunk size: {} words", cli.chunk_size);

    let store = match cli.qdrant_api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {
            QdrantStore::with_api_key(&cli.qdrant_url, &cli.collection, key)?
        }
        _ => QdrantStore::new(&cli.qdrant_url, &cli.collection),
    };

    let embedder: Box<dyn Embedder> = match cli.embedder {
        EmbedderKind::Minilm => Box::new(MiniLmEmbedder::new()?),
        EmbedderKind::Ngram => Box::new(CharacterNgramEmbedder::default()),
    };

    let options = IngestionOptions {
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.overlap,
        ..IngestionOptions::default()
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        qdrant = %cli.qdrant_url,
        "doc-ingest boot"
    );

    let pipeline = IngestionPipeline::new(embedder, store, options)?;
    let summary = pipeline.run(&files).await;

    for report in summary.reports.iter().filter(|report| report.error.is_some()) {
        println!(
            "  {}: {}",
            report.path.display(),
            report.error.as_deref().unwrap_or_default()
        );
    }

    println!();
    println!("{}", "=".repeat(50));
    println!("Summary:");
    println!("  Files processed: {}", summary.files_processed());
    println!("  Successful: {}", summary.successful());
    println!("  Empty: {}", summary.empty());
    println!("  Errors: {}", summary.errors());
    println!("  Total chunks ingested: {}", summary.total_chunks());

    Ok(())
}
