use crate::error::IngestError;
use crate::models::DEFAULT_VECTOR_SIZE;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT_VECTOR_SIZE;

pub trait Embedder {
    fn dimensions(&self) -> usize;

    /// One vector per input text, in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError>;
}

/// Hashed character-trigram embedder. Deterministic and offline; useful for
/// smoke runs and tests, not for semantic retrieval.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl CharacterNgramEmbedder {
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let mut hash = 1469598103934665603u64;
            for ch in window {
                let mut encoded = [0u8; 4];
                for byte in ch.encode_utf8(&mut encoded).bytes() {
                    hash ^= byte as u64;
                    hash = hash.wrapping_mul(1099511628211);
                }
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

impl Embedder for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

/// all-MiniLM-L6-v2 sentence embeddings run locally through ONNX Runtime.
#[cfg(feature = "local-embeddings")]
pub struct MiniLmEmbedder {
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "local-embeddings")]
impl MiniLmEmbedder {
    /// Loads the model, downloading it into the local cache on first use.
    pub fn new() -> Result<Self, IngestError> {
        let model = fastembed::TextEmbedding::try_new(fastembed::InitOptions::new(
            fastembed::EmbeddingModel::AllMiniLML6V2,
        ))
        .map_err(|error| {
            IngestError::Embedding(format!("failed to initialize embedding model: {error}"))
        })?;

        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "local-embeddings")]
impl Embedder for MiniLmEmbedder {
    fn dimensions(&self) -> usize {
        DEFAULT_EMBEDDING_DIMENSIONS
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| IngestError::Embedding("embedding model lock poisoned".to_string()))?;

        model
            .embed(texts.to_vec(), None)
            .map_err(|error| IngestError::Embedding(error.to_string()))
    }
}

#[cfg(not(feature = "local-embeddings"))]
pub struct MiniLmEmbedder;

#[cfg(not(feature = "local-embeddings"))]
impl MiniLmEmbedder {
    pub fn new() -> Result<Self, IngestError> {
        Err(IngestError::MissingDependency {
            format: "all-MiniLM-L6-v2 embeddings".to_string(),
            feature: "local-embeddings",
        })
    }
}

#[cfg(not(feature = "local-embeddings"))]
impl Embedder for MiniLmEmbedder {
    fn dimensions(&self) -> usize {
        DEFAULT_EMBEDDING_DIMENSIONS
    }

    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        Err(IngestError::MissingDependency {
            format: "all-MiniLM-L6-v2 embeddings".to_string(),
            feature: "local-embeddings",
        })
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        (**self).embed_batch(texts)
    }
}
