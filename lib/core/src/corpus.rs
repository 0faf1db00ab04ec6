use crate::{Case, Error, Result, Vector};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Historical cases paired row-for-row with their embedding vectors.
///
/// Construction checks the corpus invariants once, so every other
/// component may assume them:
/// - `cases.len() == vectors.len()`
/// - every vector has the same width `dim`
/// - `case_id` values are unique
#[derive(Debug, Clone, PartialEq)]
pub struct CaseCorpus {
    cases: Vec<Case>,
    vectors: Vec<Vector>,
    dim: usize,
}

impl CaseCorpus {
    pub fn new(cases: Vec<Case>, vectors: Vec<Vector>) -> Result<Self> {
        if cases.len() != vectors.len() {
            return Err(Error::RowCountMismatch {
                cases: cases.len(),
                vectors: vectors.len(),
            });
        }

        let dim = vectors.first().map(Vector::dim).unwrap_or(0);
        if let Some(bad) = vectors.iter().find(|v| v.dim() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: bad.dim(),
            });
        }

        let mut seen = AHashSet::with_capacity(cases.len());
        for case in &cases {
            if !seen.insert(case.case_id.as_str()) {
                return Err(Error::DuplicateCaseId(case.case_id.clone()));
            }
        }

        Ok(Self { cases, vectors, dim })
    }

    /// Rebuild a corpus from a flat row-major matrix of `rows * dim` values
    pub fn from_matrix(cases: Vec<Case>, rows: usize, dim: usize, data: Vec<f32>) -> Result<Self> {
        if rows.checked_mul(dim) != Some(data.len()) {
            return Err(Error::DimensionMismatch {
                expected: rows.saturating_mul(dim),
                actual: data.len(),
            });
        }
        let vectors = if dim == 0 {
            vec![Vector::zeros(0); rows]
        } else {
            data.chunks_exact(dim).map(Vector::from_slice).collect()
        };
        Self::new(cases, vectors)
    }

    /// Flatten the vectors into a row-major matrix
    pub fn to_matrix(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.len() * self.dim);
        for v in &self.vectors {
            data.extend_from_slice(v.as_slice());
        }
        data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Embedding width; 0 for an empty corpus
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    #[inline]
    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    pub fn get(&self, index: usize) -> Option<(&Case, &Vector)> {
        Some((self.cases.get(index)?, self.vectors.get(index)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Case, &Vector)> {
        self.cases.iter().zip(self.vectors.iter())
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats::compute(&self.cases)
    }
}

/// Summary of a historical dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_cases: usize,
    pub approved_cases: usize,
    pub rejected_cases: usize,
    /// Percentage of approved cases, 0.0 for an empty dataset
    pub approval_rate: f64,
    pub income_range: Option<(f64, f64)>,
    pub family_size_range: Option<(u32, u32)>,
}

impl CorpusStats {
    pub fn compute(cases: &[Case]) -> Self {
        let approved_cases = cases.iter().filter(|c| c.is_approved()).count();
        let total_cases = cases.len();

        let approval_rate = if total_cases == 0 {
            0.0
        } else {
            approved_cases as f64 / total_cases as f64 * 100.0
        };

        let income_range = cases
            .iter()
            .map(|c| c.income)
            .fold(None, |acc: Option<(f64, f64)>, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            });

        let family_size_range = cases
            .iter()
            .map(|c| c.family_members)
            .fold(None, |acc: Option<(u32, u32)>, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            });

        Self {
            total_cases,
            approved_cases,
            rejected_cases: total_cases - approved_cases,
            approval_rate,
            income_range,
            family_size_range,
        }
    }
}
