pub mod persistence;

pub use persistence::{CorpusStore, SnapshotMetadata, StoredCorpus, METADATA_FILE, VECTORS_FILE};
