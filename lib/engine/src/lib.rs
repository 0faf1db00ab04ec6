//! # aidx Engine
//!
//! Recommends APPROVE/REJECT for a welfare case by majority vote over the
//! most similar historical cases, and explains the recommendation from the
//! statistics of that cohort.
//!
//! ## Prediction flow
//!
//! ```text
//! CaseProfile ─> case_text ─> TextEmbedder ─> top_k (cosine) ─> aggregate ─┬─> Prediction
//!                                                                          └─> explain
//! ```
//!
//! ## Example
//!
//! ```rust
//! use aidx_core::{Case, CaseProfile, Decision};
//! use aidx_engine::{DecisionEngine, EngineConfig};
//!
//! let engine = DecisionEngine::with_hashing_embedder(EngineConfig::default()).unwrap();
//! engine
//!     .train(vec![
//!         Case::new("2024-00001", 15000.0, 8, Decision::Approved),
//!         Case::new("2024-00002", 25000.0, 6, Decision::Rejected),
//!     ])
//!     .unwrap();
//!
//! let prediction = engine.predict(&CaseProfile::new().with_income(15000.0).with_family_members(8));
//! assert!(prediction.is_ok());
//! ```

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod embedder;
pub mod engine;
pub mod explain;
pub mod prediction;
pub mod text;
pub mod triage;

pub use aggregate::{aggregate, Recommendation, Verdict};
pub use config::{EngineConfig, DEFAULT_TOP_K};
pub use dataset::{load_cases, parse_cases, parse_cases_csv};
pub use embedder::{encode_batched, HashingEmbedder, TextEmbedder, DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_DIM};
pub use engine::{DecisionEngine, EngineStatus, LoadReport};
pub use explain::{explain, CohortSummary, CommentCount, GroupSummary};
pub use prediction::{Prediction, PredictionFailure, PredictionResponse, PredictionResult};
pub use text::{case_text, FIELD_SEPARATOR};
pub use triage::{triage, ReviewPriority, ReviewStatus, Triage, DEFAULT_REVIEW_THRESHOLD};
