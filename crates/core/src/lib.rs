pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod stores;
pub mod trace;
pub mod traits;

pub use chunking::{chunk_text, split_paragraphs, word_count, ChunkingConfig};
pub use embeddings::{CharacterNgramEmbedder, Embedder, MiniLmEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IngestError, StoreError, TraceError};
pub use extractor::{extract, is_supported, supported_extensions};
pub use ingest::{
    collect_input_files, discover_files, file_hash, point_id, IngestionPipeline,
};
pub use models::{
    Chunk, ExtractedDocument, FileReport, FileStatus, IngestionOptions,
    IngestionSummary, Metadata, MetadataValue, Point, PointPayload, VectorSpec,
    DEFAULT_COLLECTION, DEFAULT_QDRANT_URL, DEFAULT_VECTOR_NAME, DEFAULT_VECTOR_SIZE,
};
pub use stores::QdrantStore;
pub use trace::{forward_record, ForwardOutcome, ToolCallEvent, TraceConfig, TraceForwarder};
pub use traits::VectorStore;
