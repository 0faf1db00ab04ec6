//! Text embedding provider seam.
//!
//! The engine only talks to [`TextEmbedder`]; any deterministic model that
//! maps a string to a fixed-width vector can sit behind it.

use aidx_core::{Error, Result, Vector};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Default width of [`HashingEmbedder`] vectors
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Default number of texts per provider call during training
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Maps strings to fixed-width vectors. Must be deterministic for a fixed
/// `model_id`.
pub trait TextEmbedder: Send + Sync {
    /// Identifier persisted alongside the corpus vectors
    fn model_id(&self) -> &str;

    /// Width of every vector returned by [`encode`](Self::encode)
    fn dim(&self) -> usize;

    /// One vector per input text, in input order
    fn encode(&self, texts: &[String]) -> Result<Vec<Vector>>;
}

/// Encode `texts` in chunks of `batch_size`, checking that the provider
/// returns one vector of width [`TextEmbedder::dim`] per text.
pub fn encode_batched(
    embedder: &dyn TextEmbedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vector>> {
    if batch_size == 0 {
        return Err(Error::InvalidConfig("batch_size must be at least 1".to_string()));
    }

    let batches = texts.len().div_ceil(batch_size);
    let mut vectors = Vec::with_capacity(texts.len());

    for (i, chunk) in texts.chunks(batch_size).enumerate() {
        let encoded = embedder.encode(chunk)?;
        if encoded.len() != chunk.len() {
            return Err(Error::Provider(format!(
                "{} returned {} vectors for {} texts",
                embedder.model_id(),
                encoded.len(),
                chunk.len()
            )));
        }
        if let Some(bad) = encoded.iter().find(|v| v.dim() != embedder.dim()) {
            return Err(Error::Provider(format!(
                "{} returned a vector of width {}, expected {}",
                embedder.model_id(),
                bad.dim(),
                embedder.dim()
            )));
        }
        if encoded
            .iter()
            .any(|v| v.as_slice().iter().any(|x| !x.is_finite()))
        {
            return Err(Error::Provider(format!(
                "{} returned a vector with non-finite components",
                embedder.model_id()
            )));
        }
        vectors.extend(encoded);
        debug!(batch = i + 1, batches, "encoded batch");
    }

    Ok(vectors)
}

/// Deterministic feature-hashing embedder.
///
/// Character trigrams and whole words of the lower-cased text are hashed
/// into `dim` buckets (words count double) and the result is L2-normalised.
/// SHA-256 bucket hashing keeps vectors stable across processes and
/// toolchains, so persisted corpora stay comparable.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            model_id: format!("hashing-trigram-{}", dim),
        }
    }

    pub fn embed(&self, text: &str) -> Vector {
        let mut components = vec![0.0f32; self.dim];
        if self.dim == 0 {
            return Vector::new(components);
        }

        let normalized = text.to_lowercase();

        for trigram in trigrams(&normalized) {
            components[self.bucket(&trigram)] += 1.0;
        }

        for word in normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            components[self.bucket(word)] += 2.0;
        }

        let mut vector = Vector::new(components);
        vector.normalize();
        vector
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dim as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

/// Character trigrams of `s` padded with two spaces on each side.
/// Empty input has no trigrams.
fn trigrams(s: &str) -> Vec<String> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();
    chars.windows(3).map(|w| w.iter().collect()).collect()
}
