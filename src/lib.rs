//! # aidx
//!
//! Decision support for welfare-aid case review. A new case is compared with
//! historical cases by cosine similarity of text embeddings; the K most
//! similar cases vote on APPROVE/REJECT and the cohort's statistics are
//! rendered as a human-readable explanation.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! aidx train --data cases.json
//! aidx serve --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use aidx::prelude::*;
//!
//! let engine = DecisionEngine::with_hashing_embedder(EngineConfig::default()).unwrap();
//! engine
//!     .train(vec![
//!         Case::new("A", 15000.0, 8, Decision::Approved),
//!         Case::new("B", 25000.0, 6, Decision::Rejected),
//!     ])
//!     .unwrap();
//!
//! let query = CaseProfile::new().with_income(15000.0).with_family_members(8);
//! let prediction = engine.predict(&query);
//! println!("{}", serde_json::to_string_pretty(&prediction).unwrap());
//! ```
//!
//! ## Crate Structure
//!
//! - `aidx-core` - Case records, vectors, corpus and top-K similarity search
//! - `aidx-storage` - Persisted corpus snapshots
//! - `aidx-engine` - Embedding, voting, explanation and the decision engine
//! - `aidx-api` - REST API

// Re-export core types
pub use aidx_core::{
    Case, CaseCorpus, CaseProfile, CorpusStats, Decision, Error, Neighbor, Result, ScoredCase,
    Vector,
};

// Re-export storage
pub use aidx_storage::{CorpusStore, SnapshotMetadata};

// Re-export engine
pub use aidx_engine::{
    load_cases, triage, DecisionEngine, EngineConfig, EngineStatus, HashingEmbedder, LoadReport,
    Prediction, PredictionResponse, PredictionResult, Recommendation, ReviewPriority,
    ReviewStatus, TextEmbedder, Triage,
};

// Re-export API
pub use aidx_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Case, CaseProfile, Decision,
        DecisionEngine, EngineConfig, TextEmbedder, HashingEmbedder,
        Prediction, PredictionResponse, Recommendation,
        Error, Result,
        RestApi,
    };
}
