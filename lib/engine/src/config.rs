use crate::embedder::{DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_DIM};
use crate::triage::DEFAULT_REVIEW_THRESHOLD;
use aidx_core::{Error, Result};
use std::path::PathBuf;

/// Default number of neighbours consulted per prediction
pub const DEFAULT_TOP_K: usize = 20;

/// Configuration for a [`DecisionEngine`](crate::DecisionEngine)
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub top_k: usize,
    /// Texts per embedding call during training
    pub batch_size: usize,
    /// Snapshot directory used by the CLI and server
    pub model_dir: PathBuf,
    pub embedding_dim: usize,
    pub review_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            batch_size: DEFAULT_BATCH_SIZE,
            model_dir: PathBuf::from("./model_cache"),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        if self.embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding_dim must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.review_threshold) {
            return Err(Error::InvalidConfig(format!(
                "review_threshold must be within [0, 1], got {}",
                self.review_threshold
            )));
        }
        Ok(())
    }
}
