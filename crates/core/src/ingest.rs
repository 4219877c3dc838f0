use crate::chunking::{chunk_text, word_count, ChunkingConfig};
use crate::embeddings::Embedder;
use crate::extractor::{extract, is_supported};
use crate::models::{
    Chunk, ExtractedDocument, FileReport, IngestionOptions, IngestionSummary, Metadata, Point,
    PointPayload,
};
use crate::traits::VectorStore;
use crate::IngestError;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

const SOURCE_TAG: &str = "local_file";
const FILE_HASH_LEN: usize = 12;

/// Supported files under `folder`: direct children, or the whole tree when `recursive`.
pub fn discover_files(folder: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(folder).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|item| item.ok())
        .filter(|entry| entry.file_type().is_file() && is_supported(entry.path()))
        .map(|entry| entry.path().to_path_buf())
        .collect();

    files.sort_unstable();
    files
}

/// Resolves the command-line `path` argument into the list of files to ingest.
pub fn collect_input_files(path: &Path, recursive: bool) -> Result<Vec<PathBuf>, IngestError> {
    if path.is_file() {
        if is_supported(path) {
            return Ok(vec![path.to_path_buf()]);
        }
        let ext = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        return Err(IngestError::UnsupportedFormat(ext));
    }

    if path.is_dir() {
        let files = discover_files(path, recursive);
        if files.is_empty() {
            return Err(IngestError::NoSupportedFiles(path.display().to_string()));
        }
        return Ok(files);
    }

    Err(IngestError::PathNotFound(path.display().to_string()))
}

fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Short content hash of a whole source file; identical bytes give an identical hash.
pub fn file_hash(bytes: &[u8]) -> String {
    let mut digest = digest_bytes(bytes);
    digest.truncate(FILE_HASH_LEN);
    digest
}

/// Stable point id for chunk `index` of the file whose hash is `file_hash`.
pub fn point_id(file_hash: &str, index: usize) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{file_hash}_{index}").as_bytes()).to_string()
}

fn absolute_path(path: &Path) -> Result<PathBuf, IngestError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Fixed per-chunk fields, overlaid with the extractor's non-null metadata.
pub fn chunk_metadata(
    path: &Path,
    document: &ExtractedDocument,
    chunk: &Chunk,
    index: usize,
    total_chunks: usize,
    harvested_at: &str,
) -> Result<Metadata, IngestError> {
    let absolute = absolute_path(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;

    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), SOURCE_TAG.into());
    metadata.insert(
        "content_type".to_string(),
        document.format().unwrap_or("text").into(),
    );
    metadata.insert(
        "file_path".to_string(),
        absolute.to_string_lossy().to_string().into(),
    );
    metadata.insert("filename".to_string(), filename.into());
    metadata.insert("harvested_at".to_string(), harvested_at.into());
    metadata.insert("chunk_index".to_string(), index.into());
    metadata.insert("total_chunks".to_string(), total_chunks.into());
    metadata.insert("word_count".to_string(), chunk.word_count.into());

    for (key, value) in &document.metadata {
        if !value.is_null() {
            metadata.insert(key.clone(), value.clone());
        }
    }

    Ok(metadata)
}

pub struct IngestionPipeline<E, S> {
    embedder: E,
    store: S,
    options: IngestionOptions,
}

impl<E, S> IngestionPipeline<E, S>
where
    E: Embedder,
    S: VectorStore + Send + Sync,
{
    pub fn new(embedder: E, store: S, options: IngestionOptions) -> Result<Self, IngestError> {
        if options.upsert_batch_size == 0 {
            return Err(IngestError::InvalidArgument(
                "upsert batch size must be positive".to_string(),
            ));
        }

        if embedder.dimensions() != options.vector.size {
            return Err(IngestError::InvalidArgument(format!(
                "embedder produces {} dimensions but collection vectors are {}",
                embedder.dimensions(),
                options.vector.size
            )));
        }

        Ok(Self {
            embedder,
            store,
            options,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingests every file in order. A failing file is recorded and the run moves on.
    pub async fn run(&self, files: &[PathBuf]) -> IngestionSummary {
        let mut summary = IngestionSummary::default();

        for path in files {
            let report = match self.ingest_file(path).await {
                Ok(report) => report,
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "file ingestion failed");
                    FileReport::failed(path.clone(), error.to_string())
                }
            };
            summary.reports.push(report);
        }

        summary
    }

    pub async fn ingest_file(&self, path: &Path) -> Result<FileReport, IngestError> {
        info!(path = %path.display(), "processing file");

        let document = extract(path)?;
        if document.text.trim().is_empty() {
            warn!(path = %path.display(), "no text extracted");
            return Ok(FileReport::empty(path.to_path_buf()));
        }

        let chunks = chunk_text(&document.text, ChunkingConfig::from(&self.options));
        info!(
            path = %path.display(),
            words = word_count(&document.text),
            chunks = chunks.len(),
            "chunked document"
        );

        let ingested = self.ingest_chunks(path, &document, &chunks).await?;
        Ok(FileReport::success(
            path.to_path_buf(),
            ingested,
            Some(document.format().unwrap_or("unknown").to_string()),
        ))
    }

    /// Embeds `chunks` and upserts them in batches; returns the number of points written.
    pub async fn ingest_chunks(
        &self,
        path: &Path,
        document: &ExtractedDocument,
        chunks: &[Chunk],
    ) -> Result<usize, IngestError> {
        if self.store.ensure_collection(&self.options.vector).await? {
            info!(collection = self.store.collection(), "created collection");
        }

        let contents: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        info!(count = contents.len(), "generating embeddings");
        let embeddings = self.embedder.embed_batch(&contents)?;

        let file_hash = file_hash(&fs::read(path)?);
        let harvested_at = Utc::now().to_rfc3339();
        let points = self.build_points(path, document, chunks, embeddings, &file_hash, &harvested_at)?;

        let total = points.len();
        let mut ingested = 0usize;
        for batch in points.chunks(self.options.upsert_batch_size) {
            self.store.upsert_points(batch).await?;
            ingested += batch.len();
            info!(
                collection = self.store.collection(),
                ingested,
                total,
                "upserted batch"
            );
        }

        Ok(total)
    }

    fn build_points(
        &self,
        path: &Path,
        document: &ExtractedDocument,
        chunks: &[Chunk],
        embeddings: Vec<Vec<f32>>,
        file_hash: &str,
        harvested_at: &str,
    ) -> Result<Vec<Point>, IngestError> {
        if chunks.len() != embeddings.len() {
            return Err(IngestError::Embedding(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (chunk, embedding))| {
                if embedding.len() != self.options.vector.size {
                    return Err(IngestError::Embedding(format!(
                        "embedding dimension {} != {}",
                        embedding.len(),
                        self.options.vector.size
                    )));
                }

                let mut vector = BTreeMap::new();
                vector.insert(self.options.vector.name.clone(), embedding);

                Ok(Point {
                    id: point_id(file_hash, index),
                    vector,
                    payload: PointPayload {
                        document: chunk.content.clone(),
                        metadata: chunk_metadata(
                            path,
                            document,
                            chunk,
                            index,
                            chunks.len(),
                            harvested_at,
                        )?,
                    },
                })
            })
            .collect()
    }
}
