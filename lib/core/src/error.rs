use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Engine not trained: call train() or load() first")]
    NotTrained,

    #[error("Persisted artifact(s) missing: {}", display_paths(.paths))]
    ArtifactMissing { paths: Vec<PathBuf> },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corpus misaligned: {cases} cases but {vectors} vectors")]
    RowCountMismatch { cases: usize, vectors: usize },

    #[error("Duplicate case id: {0}")]
    DuplicateCaseId(String),

    #[error("Invalid case {case_id}: {reason}")]
    InvalidCase { case_id: String, reason: String },

    #[error("Embedding provider error: {0}")]
    Provider(String),

    #[error("Corpus is empty")]
    EmptyCorpus,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
