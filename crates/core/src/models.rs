use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Name of the vector slot the downstream MCP server reads from.
pub const DEFAULT_VECTOR_NAME: &str = "fast-all-minilm-l6-v2";
pub const DEFAULT_VECTOR_SIZE: usize = 384;
pub const DEFAULT_COLLECTION: &str = "personal_memories";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl MetadataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MetadataValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl<T: Into<MetadataValue>> From<Option<T>> for MetadataValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(MetadataValue::Null)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Text pulled out of one input file plus whatever the format could tell us about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub text: String,
    pub metadata: Metadata,
}

impl ExtractedDocument {
    pub fn new(text: impl Into<String>, format: &str) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("format".to_string(), format.into());
        Self {
            text: text.into(),
            metadata,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn format(&self) -> Option<&str> {
        self.metadata.get("format").and_then(MetadataValue::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointPayload {
    pub document: String,
    pub metadata: Metadata,
}

/// One embedded chunk as written to the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    pub vector: BTreeMap<String, Vec<f32>>,
    pub payload: PointPayload,
}

/// Named dense vector of the collection. Qdrant compares them by cosine distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorSpec {
    pub name: String,
    pub size: usize,
}

impl Default for VectorSpec {
    fn default() -> Self {
        Self {
            name: DEFAULT_VECTOR_NAME.to_string(),
            size: DEFAULT_VECTOR_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub upsert_batch_size: usize,
    pub vector: VectorSpec,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            chunk_overlap: 50,
            upsert_batch_size: 100,
            vector: VectorSpec::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Empty,
    Error,
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub chunks: usize,
    pub format: Option<String>,
    pub error: Option<String>,
}

impl FileReport {
    pub fn success(path: PathBuf, chunks: usize, format: Option<String>) -> Self {
        Self {
            path,
            status: FileStatus::Success,
            chunks,
            format,
            error: None,
        }
    }

    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            status: FileStatus::Empty,
            chunks: 0,
            format: None,
            error: None,
        }
    }

    pub fn failed(path: PathBuf, error: String) -> Self {
        Self {
            path,
            status: FileStatus::Error,
            chunks: 0,
            format: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestionSummary {
    pub reports: Vec<FileReport>,
}

impl IngestionSummary {
    pub fn files_processed(&self) -> usize {
        self.reports.len()
    }

    pub fn successful(&self) -> usize {
        self.count(FileStatus::Success)
    }

    pub fn empty(&self) -> usize {
        self.count(FileStatus::Empty)
    }

    pub fn errors(&self) -> usize {
        self.count(FileStatus::Error)
    }

    pub fn total_chunks(&self) -> usize {
        self.reports.iter().map(|report| report.chunks).sum()
    }

    fn count(&self, status: FileStatus) -> usize {
        self.reports
            .iter()
            .filter(|report| report.status == status)
            .count()
    }
}
