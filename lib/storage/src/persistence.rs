//! Two-artifact corpus persistence.
//!
//! A snapshot directory holds:
//! - `embeddings.bin` - the raw N×D vector matrix (bincode)
//! - `engine.json` - the case table plus model id, trained flag and the
//!   SHA-256 of `embeddings.bin`
//!
//! Both files are written atomically; the metadata file is written last so
//! a crash mid-save never leaves a metadata file pointing at stale vectors.
//! Loading is all-or-nothing.

use aidx_core::{Case, CaseCorpus, Error, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

pub const VECTORS_FILE: &str = "embeddings.bin";
pub const METADATA_FILE: &str = "engine.json";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct VectorMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

/// Everything in the metadata artifact except the cases themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub format_version: u32,
    pub snapshot_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub model_id: String,
    pub trained: bool,
    pub rows: usize,
    pub dim: usize,
    pub vectors_sha256: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct EngineSnapshot {
    #[serde(flatten)]
    metadata: SnapshotMetadata,
    cases: Vec<Case>,
}

/// A corpus restored from disk together with the metadata it was saved with
#[derive(Debug, Clone)]
pub struct StoredCorpus {
    pub corpus: CaseCorpus,
    pub metadata: SnapshotMetadata,
}

/// Saves and restores a [`CaseCorpus`] in a snapshot directory
#[derive(Debug, Clone)]
pub struct CorpusStore {
    dir: PathBuf,
    vectors_path: PathBuf,
    metadata_path: PathBuf,
}

impl CorpusStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let vectors_path = dir.join(VECTORS_FILE);
        let metadata_path = dir.join(METADATA_FILE);

        Self {
            dir,
            vectors_path,
            metadata_path,
        }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn vectors_path(&self) -> &Path {
        &self.vectors_path
    }

    #[inline]
    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// True when both artifacts are present
    pub fn exists(&self) -> bool {
        self.vectors_path.is_file() && self.metadata_path.is_file()
    }

    /// Write both artifacts for `corpus`, embedded with `model_id`
    pub fn save(&self, corpus: &CaseCorpus, model_id: &str) -> Result<SnapshotMetadata> {
        std::fs::create_dir_all(&self.dir)?;

        let matrix = VectorMatrix {
            rows: corpus.len(),
            dim: corpus.dim(),
            data: corpus.to_matrix(),
        };
        let vector_bytes = bincode::serialize(&matrix)
            .map_err(|e| Error::Serialization(format!("vector matrix: {}", e)))?;

        let metadata = SnapshotMetadata {
            format_version: FORMAT_VERSION,
            snapshot_id: Uuid::new_v4(),
            created_at: Utc::now(),
            model_id: model_id.to_string(),
            trained: true,
            rows: matrix.rows,
            dim: matrix.dim,
            vectors_sha256: sha256_hex(&vector_bytes),
        };

        let snapshot = EngineSnapshot {
            metadata: metadata.clone(),
            cases: corpus.cases().to_vec(),
        };
        let metadata_bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| Error::Serialization(format!("engine metadata: {}", e)))?;

        write_atomic(&self.vectors_path, &vector_bytes)?;
        debug!(path = %self.vectors_path.display(), bytes = vector_bytes.len(), "wrote vector matrix");
        write_atomic(&self.metadata_path, &metadata_bytes)?;
        debug!(path = %self.metadata_path.display(), bytes = metadata_bytes.len(), "wrote engine metadata");

        info!(
            dir = %self.dir.display(),
            rows = metadata.rows,
            dim = metadata.dim,
            snapshot_id = %metadata.snapshot_id,
            "corpus snapshot saved"
        );
        Ok(metadata)
    }

    /// Restore the corpus. Fails without side effects if either artifact is
    /// missing, unreadable or inconsistent with the other.
    pub fn load(&self) -> Result<StoredCorpus> {
        let missing: Vec<PathBuf> = [&self.vectors_path, &self.metadata_path]
            .into_iter()
            .filter(|p| !p.is_file())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::ArtifactMissing { paths: missing });
        }

        let vector_bytes = std::fs::read(&self.vectors_path)?;
        let matrix: VectorMatrix = bincode::deserialize(&vector_bytes)
            .map_err(|e| Error::Serialization(format!("vector matrix: {}", e)))?;

        let metadata_bytes = std::fs::read(&self.metadata_path)?;
        let snapshot: EngineSnapshot = serde_json::from_slice(&metadata_bytes)
            .map_err(|e| Error::Serialization(format!("engine metadata: {}", e)))?;
        let metadata = snapshot.metadata;

        if metadata.format_version != FORMAT_VERSION {
            return Err(Error::Persistence(format!(
                "unsupported snapshot format version {} (expected {})",
                metadata.format_version, FORMAT_VERSION
            )));
        }
        if !metadata.trained {
            return Err(Error::Persistence(
                "snapshot was saved from an untrained engine".to_string(),
            ));
        }
        let checksum = sha256_hex(&vector_bytes);
        if checksum != metadata.vectors_sha256 {
            return Err(Error::Persistence(format!(
                "vector matrix checksum mismatch: metadata records {}, file hashes to {}",
                metadata.vectors_sha256, checksum
            )));
        }
        if matrix.dim != metadata.dim {
            return Err(Error::DimensionMismatch {
                expected: metadata.dim,
                actual: matrix.dim,
            });
        }
        if matrix.rows != snapshot.cases.len() {
            return Err(Error::RowCountMismatch {
                cases: snapshot.cases.len(),
                vectors: matrix.rows,
            });
        }

        let corpus = CaseCorpus::from_matrix(snapshot.cases, matrix.rows, matrix.dim, matrix.data)?;

        info!(
            dir = %self.dir.display(),
            rows = corpus.len(),
            dim = corpus.dim(),
            model_id = %metadata.model_id,
            "corpus snapshot loaded"
        );
        Ok(StoredCorpus { corpus, metadata })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| Error::Persistence(format!("writing {}: {}", path.display(), e)))
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidx_core::{Decision, Vector};

    fn sample_corpus() -> CaseCorpus {
        CaseCorpus::new(
            vec![
                Case::new("2024-00001", 15000.0, 8, Decision::Approved)
                    .with_officer_comment("Approve")
                    .with_aid_amount(10000.0),
                Case::new("2024-00002", 25000.0, 6, Decision::Rejected)
                    .with_enquiry_feedback("Clean house"),
            ],
            vec![
                Vector::new(vec![0.1, 0.2, 0.3]),
                Vector::new(vec![0.4, 0.5, 0.6]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path().join("cache"));
        let corpus = sample_corpus();

        let saved = store.save(&corpus, "hashing-trigram-3").unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.corpus, corpus);
        assert_eq!(loaded.metadata, saved);
        assert_eq!(loaded.metadata.model_id, "hashing-trigram-3");
        assert!(loaded.metadata.trained);
    }

    #[test]
    fn test_fractional_values_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());

        let cases: Vec<Case> = (0..500)
            .map(|k| {
                Case::new(format!("c{}", k), k as f64 / 1e5 + 1.0 / 3.0, 3, Decision::Approved)
                    .with_aid_amount(k as f64 * 0.1 + 2.0 / 7.0)
            })
            .collect();
        let vectors = (0..500).map(|k| Vector::new(vec![k as f32 / 7.0, 1.0 / 3.0])).collect();
        let corpus = CaseCorpus::new(cases, vectors).unwrap();

        store.save(&corpus, "m").unwrap();
        let loaded = store.load().unwrap().corpus;

        for (before, after) in corpus.cases().iter().zip(loaded.cases()) {
            assert_eq!(before.income.to_bits(), after.income.to_bits(), "{}", before.case_id);
            assert_eq!(
                before.aid_amount.map(f64::to_bits),
                after.aid_amount.map(f64::to_bits),
                "{}",
                before.case_id
            );
        }
        assert_eq!(loaded, corpus);
    }

    /// Rewrite `engine.json` through `edit` without touching the vectors
    fn edit_metadata(store: &CorpusStore, edit: impl FnOnce(&mut serde_json::Value)) {
        let mut json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.metadata_path()).unwrap()).unwrap();
        edit(&mut json);
        std::fs::write(store.metadata_path(), serde_json::to_vec(&json).unwrap()).unwrap();
    }

    #[test]
    fn test_untrained_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());
        store.save(&sample_corpus(), "m").unwrap();
        edit_metadata(&store, |json| json["trained"] = serde_json::json!(false));

        match store.load() {
            Err(Error::Persistence(msg)) => assert!(msg.contains("untrained"), "{}", msg),
            other => panic!("expected Persistence, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_format_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());
        store.save(&sample_corpus(), "m").unwrap();
        edit_metadata(&store, |json| json["format_version"] = serde_json::json!(FORMAT_VERSION + 1));

        match store.load() {
            Err(Error::Persistence(msg)) => assert!(msg.contains("format version"), "{}", msg),
            other => panic!("expected Persistence, got {:?}", other),
        }
    }

    #[test]
    fn test_case_table_shorter_than_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());
        store.save(&sample_corpus(), "m").unwrap();
        edit_metadata(&store, |json| {
            json["cases"].as_array_mut().unwrap().pop();
        });

        assert!(matches!(
            store.load(),
            Err(Error::RowCountMismatch { cases: 1, vectors: 2 })
        ));
    }

    #[test]
    fn test_checksum_is_lowercase_hex() {
        let digest = sha256_hex(b"abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_missing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());
        store.save(&sample_corpus(), "m").unwrap();
        std::fs::remove_file(store.metadata_path()).unwrap();

        match store.load() {
            Err(Error::ArtifactMissing { paths }) => {
                assert_eq!(paths, vec![store.metadata_path().to_path_buf()]);
            }
            other => panic!("expected ArtifactMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_both() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path().join("nothing-here"));

        match store.load() {
            Err(Error::ArtifactMissing { paths }) => assert_eq!(paths.len(), 2),
            other => panic!("expected ArtifactMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_tampered_vectors_fail_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());
        let other = CorpusStore::new(dir.path().join("other"));

        store.save(&sample_corpus(), "m").unwrap();
        let mut swapped = sample_corpus().cases().to_vec();
        swapped.reverse();
        let different = CaseCorpus::new(
            swapped,
            vec![Vector::new(vec![9.0, 9.0, 9.0]), Vector::new(vec![8.0, 8.0, 8.0])],
        )
        .unwrap();
        other.save(&different, "m").unwrap();
        std::fs::copy(other.vectors_path(), store.vectors_path()).unwrap();

        assert!(matches!(store.load(), Err(Error::Persistence(_))));
    }

    #[test]
    fn test_garbage_metadata_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());
        store.save(&sample_corpus(), "m").unwrap();
        std::fs::write(store.metadata_path(), b"not json").unwrap();

        assert!(matches!(store.load(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_metadata_is_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());
        store.save(&sample_corpus(), "m").unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.metadata_path()).unwrap()).unwrap();
        assert_eq!(json["model_id"], "m");
        assert_eq!(json["trained"], true);
        assert_eq!(json["rows"], 2);
        assert_eq!(json["cases"][1]["case_id"], "2024-00002");
    }
}
