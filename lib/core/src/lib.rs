//! # aidx Core
//!
//! Core data structures for the aidx decision-support engine.
//!
//! - [`Case`] / [`CaseProfile`] - historical and candidate welfare cases
//! - [`Vector`] - dense embedding with cosine similarity
//! - [`CaseCorpus`] - cases aligned row-for-row with their vectors
//! - [`search::top_k`] - exact cosine nearest-neighbour retrieval
//!
//! ## Example
//!
//! ```rust
//! use aidx_core::{search, Case, CaseCorpus, Decision, Vector};
//!
//! let corpus = CaseCorpus::new(
//!     vec![
//!         Case::new("2024-00001", 15000.0, 8, Decision::Approved),
//!         Case::new("2024-00002", 25000.0, 6, Decision::Rejected),
//!     ],
//!     vec![Vector::new(vec![1.0, 0.0]), Vector::new(vec![0.0, 1.0])],
//! )
//! .unwrap();
//!
//! let query = Vector::new(vec![0.9, 0.1]);
//! let neighbors = search::top_k(&query, &corpus, 1).unwrap();
//! assert_eq!(neighbors[0].case.case_id, "2024-00001");
//! ```

pub mod case;
pub mod corpus;
pub mod error;
pub mod search;
pub mod vector;

pub use case::{Case, CaseProfile, Decision};
pub use corpus::{CaseCorpus, CorpusStats};
pub use error::{Error, Result};
pub use search::{Neighbor, ScoredCase};
pub use vector::Vector;
