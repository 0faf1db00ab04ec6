//! Exact cosine top-K retrieval over a [`CaseCorpus`].

use crate::{Case, CaseCorpus, Error, Result, Vector};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A corpus row matched by a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a> {
    /// Row index in the corpus
    pub index: usize,
    pub case: &'a Case,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

impl Neighbor<'_> {
    pub fn to_scored(&self) -> ScoredCase {
        ScoredCase {
            case: self.case.clone(),
            similarity_score: self.score,
        }
    }
}

/// An owned historical case annotated with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCase {
    #[serde(flatten)]
    pub case: Case,
    pub similarity_score: f32,
}

/// Return the `k` rows most similar to `query`, best first.
///
/// `k` is clamped to the corpus size. Equal scores keep corpus row order.
pub fn top_k<'a>(query: &Vector, corpus: &'a CaseCorpus, k: usize) -> Result<Vec<Neighbor<'a>>> {
    if corpus.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    if query.dim() != corpus.dim() {
        return Err(Error::DimensionMismatch {
            expected: corpus.dim(),
            actual: query.dim(),
        });
    }

    let mut scored: Vec<Neighbor<'a>> = corpus
        .iter()
        .enumerate()
        .map(|(index, (case, vector))| Neighbor {
            index,
            case,
            score: query.cosine_similarity(vector),
        })
        .collect();

    // sort_by is stable: ties stay in row order
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k.min(corpus.len()));
    Ok(scored)
}
