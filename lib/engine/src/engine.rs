use crate::aggregate::aggregate;
use crate::config::EngineConfig;
use crate::embedder::{encode_batched, HashingEmbedder, TextEmbedder};
use crate::explain::explain;
use crate::prediction::{Prediction, PredictionResult};
use crate::text::case_text;
use aidx_core::{search, Case, CaseCorpus, CaseProfile, CorpusStats, Error, Result};
use aidx_storage::{CorpusStore, SnapshotMetadata};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    Uninitialized,
    Trained,
}

/// What [`DecisionEngine::load`] restored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub cases: usize,
    pub dim: usize,
    pub stored_model_id: String,
    /// The snapshot was embedded with a different model than the running one.
    /// Not fatal: the vectors are internally consistent, but queries embedded
    /// by the current model may not be comparable with them.
    pub model_mismatch: bool,
    pub snapshot_id: String,
    pub snapshot_created_at: DateTime<Utc>,
}

struct TrainedCorpus {
    corpus: CaseCorpus,
    model_id: String,
    stats: CorpusStats,
}

enum EngineState {
    Uninitialized,
    Trained(TrainedCorpus),
}

/// Case-similarity decision engine.
///
/// Construct one per process and share it by `Arc`. `predict` takes a read
/// lock on the corpus; `train` and `load` build the replacement corpus first
/// and swap it in under the write lock, so a failed `train` or `load` leaves
/// the previous state untouched.
pub struct DecisionEngine {
    config: EngineConfig,
    embedder: Arc<dyn TextEmbedder>,
    state: RwLock<EngineState>,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig, embedder: Arc<dyn TextEmbedder>) -> Result<Self> {
        config.validate()?;
        info!(
            model_id = embedder.model_id(),
            dim = embedder.dim(),
            top_k = config.top_k,
            "initializing decision engine"
        );
        Ok(Self {
            config,
            embedder,
            state: RwLock::new(EngineState::Uninitialized),
        })
    }

    /// Engine backed by a [`HashingEmbedder`] of `config.embedding_dim`
    pub fn with_hashing_embedder(config: EngineConfig) -> Result<Self> {
        let embedder = Arc::new(HashingEmbedder::new(config.embedding_dim));
        Self::new(config, embedder)
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Model id of the running embedder
    #[inline]
    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    pub fn status(&self) -> EngineStatus {
        match *self.state.read() {
            EngineState::Uninitialized => EngineStatus::Uninitialized,
            EngineState::Trained(_) => EngineStatus::Trained,
        }
    }

    #[inline]
    pub fn is_trained(&self) -> bool {
        self.status() == EngineStatus::Trained
    }

    /// Number of historical cases held; 0 when untrained
    pub fn case_count(&self) -> usize {
        match &*self.state.read() {
            EngineState::Uninitialized => 0,
            EngineState::Trained(t) => t.corpus.len(),
        }
    }

    pub fn stats(&self) -> Result<CorpusStats> {
        match &*self.state.read() {
            EngineState::Uninitialized => Err(Error::NotTrained),
            EngineState::Trained(t) => Ok(t.stats.clone()),
        }
    }

    /// Embed `cases` and make them the corpus, replacing any previous one
    pub fn train(&self, cases: Vec<Case>) -> Result<CorpusStats> {
        info!(cases = cases.len(), "training decision engine");

        for case in &cases {
            case.validate()?;
        }

        let texts: Vec<String> = cases.iter().map(|c| case_text(&c.profile())).collect();
        let vectors = encode_batched(self.embedder.as_ref(), &texts, self.config.batch_size)?;
        let corpus = CaseCorpus::new(cases, vectors)?;
        let stats = corpus.stats();

        info!(
            total = stats.total_cases,
            approved = stats.approved_cases,
            rejected = stats.rejected_cases,
            approval_rate = %format!("{:.1}", stats.approval_rate),
            dim = corpus.dim(),
            "training complete"
        );

        *self.state.write() = EngineState::Trained(TrainedCorpus {
            corpus,
            model_id: self.embedder.model_id().to_string(),
            stats: stats.clone(),
        });
        Ok(stats)
    }

    /// Recommend a decision for `query` using the configured `top_k`.
    ///
    /// Never fails: errors become [`Prediction::Failed`].
    pub fn predict(&self, query: &CaseProfile) -> Prediction {
        self.predict_with_k(query, self.config.top_k)
    }

    pub fn predict_with_k(&self, query: &CaseProfile, k: usize) -> Prediction {
        match self.try_predict_with_k(query, k) {
            Ok(result) => Prediction::Recommended(result),
            Err(e) => {
                warn!(error = %e, "prediction failed");
                Prediction::failed(e.to_string())
            }
        }
    }

    /// Like [`predict`](Self::predict) but surfaces the typed error
    pub fn try_predict(&self, query: &CaseProfile) -> Result<PredictionResult> {
        self.try_predict_with_k(query, self.config.top_k)
    }

    pub fn try_predict_with_k(&self, query: &CaseProfile, k: usize) -> Result<PredictionResult> {
        if k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".to_string()));
        }

        let state = self.state.read();
        let trained = match &*state {
            EngineState::Uninitialized => return Err(Error::NotTrained),
            EngineState::Trained(t) => t,
        };
        if trained.corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let text = case_text(query);
        let query_vector = encode_batched(self.embedder.as_ref(), &[text], 1)?
            .pop()
            .ok_or_else(|| Error::Provider("no vector returned for query".to_string()))?;

        let neighbors = search::top_k(&query_vector, &trained.corpus, k)?;
        let verdict = aggregate(&neighbors)?;
        let explanation = explain(query, &neighbors, &verdict);

        Ok(PredictionResult {
            recommendation: verdict.recommendation,
            confidence: verdict.confidence,
            explanation,
            similar_cases_count: neighbors.len(),
            approved_matches: verdict.approved,
            rejected_matches: verdict.rejected,
            top_similar_cases: neighbors.iter().map(|n| n.to_scored()).collect(),
            generated_at: Utc::now(),
        })
    }

    /// Persist the corpus to `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<SnapshotMetadata> {
        let state = self.state.read();
        match &*state {
            EngineState::Uninitialized => Err(Error::NotTrained),
            EngineState::Trained(t) => CorpusStore::new(dir).save(&t.corpus, &t.model_id),
        }
    }

    /// Persist the corpus to the configured `model_dir`
    pub fn save_to_model_dir(&self) -> Result<SnapshotMetadata> {
        self.save(&self.config.model_dir)
    }

    /// Restore the corpus from the configured `model_dir`
    pub fn load_from_model_dir(&self) -> Result<LoadReport> {
        self.load(&self.config.model_dir)
    }

    /// Replace the corpus with the snapshot in `dir`. On failure the engine
    /// keeps whatever state it had.
    pub fn load<P: AsRef<Path>>(&self, dir: P) -> Result<LoadReport> {
        let stored = CorpusStore::new(dir).load()?;
        let metadata = stored.metadata;
        let corpus = stored.corpus;

        let model_mismatch = metadata.model_id != self.embedder.model_id();
        if model_mismatch {
            warn!(
                stored = %metadata.model_id,
                running = self.embedder.model_id(),
                "snapshot was embedded with a different model"
            );
        }

        let report = LoadReport {
            cases: corpus.len(),
            dim: corpus.dim(),
            stored_model_id: metadata.model_id.clone(),
            model_mismatch,
            snapshot_id: metadata.snapshot_id.to_string(),
            snapshot_created_at: metadata.created_at,
        };

        let stats = corpus.stats();
        *self.state.write() = EngineState::Trained(TrainedCorpus {
            corpus,
            model_id: metadata.model_id,
            stats,
        });

        info!(cases = report.cases, dim = report.dim, "decision engine loaded");
        Ok(report)
    }
}
